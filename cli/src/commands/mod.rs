mod ask;
mod helpers;
mod list;
mod plan;
mod recipe;
mod user;

pub(crate) use ask::cmd_chef;
pub(crate) use list::{
    cmd_list_add, cmd_list_check, cmd_list_cleanup, cmd_list_clear, cmd_list_clear_checked,
    cmd_list_delete, cmd_list_show, cmd_list_sync,
};
pub(crate) use plan::{cmd_plan_add, cmd_plan_clear, cmd_plan_move, cmd_plan_remove, cmd_plan_week};
pub(crate) use recipe::{
    RecipeFields, build_query, cmd_recipe_add, cmd_recipe_delete, cmd_recipe_edit,
    cmd_recipe_favorite, cmd_recipe_image, cmd_recipe_import, cmd_recipe_list, cmd_recipe_show,
};
pub(crate) use user::{cmd_user_add, cmd_whoami};
