use anyhow::Result;

use recipebox_core::models::Session;
use recipebox_core::service::RecipeBoxService;

pub(crate) fn cmd_user_add(svc: &RecipeBoxService, username: &str, json: bool) -> Result<()> {
    let (user, token) = svc.create_user(username)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "user": user, "token": token })
        );
    } else {
        println!("Created user {} (id: {})", user.username, user.id);
        println!("API token: {token}");
        println!("Include in requests: Authorization: Bearer {token}");
        println!("Use this user locally with RECIPEBOX_USER={}", user.username);
    }
    Ok(())
}

pub(crate) fn cmd_whoami(svc: &RecipeBoxService, session: &Session, json: bool) -> Result<()> {
    let token = svc.user_token(session)?;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "user_id": session.user_id,
                "username": session.username,
                "token": token,
            })
        );
    } else {
        println!("{} (id: {})", session.username, session.user_id);
        println!("API token: {token}");
    }
    Ok(())
}
