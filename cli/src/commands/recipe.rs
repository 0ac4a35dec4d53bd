use anyhow::{Context, Result, bail};

use recipebox_core::browse::{RecipeQuery, RecipeSort};
use recipebox_core::models::{Ingredient, MealType, NewRecipe, RecipeUpdate, Session};
use recipebox_core::service::RecipeBoxService;
use recipebox_core::view::RecipeListView;

use super::helpers::{exit_not_found, parse_ingredient, print_recipe_table};

/// Editable recipe fields shared by `recipe add` and `recipe edit`.
#[derive(clap::Args)]
pub(crate) struct RecipeFields {
    /// Cooking time (e.g. "30 mins", "1 hr 15 mins")
    #[arg(short, long)]
    pub time: Option<String>,
    /// Servings (e.g. "4")
    #[arg(short, long)]
    pub servings: Option<String>,
    /// Category: breakfast, lunch, dinner, dessert
    #[arg(short, long)]
    pub category: Option<String>,
    /// Ingredient as "qty|unit|name" (repeatable)
    #[arg(short, long = "ingredient")]
    pub ingredients: Vec<String>,
    /// Free-text instructions
    #[arg(long)]
    pub instructions: Option<String>,
}

impl RecipeFields {
    fn parsed_ingredients(&self) -> Result<Vec<Ingredient>> {
        self.ingredients.iter().map(|s| parse_ingredient(s)).collect()
    }

    fn parsed_category(&self) -> Result<Option<MealType>> {
        Ok(self.category.as_deref().map(str::parse).transpose()?)
    }
}

pub(crate) fn cmd_recipe_add(
    svc: &RecipeBoxService,
    session: &Session,
    title: &str,
    fields: &RecipeFields,
    json: bool,
) -> Result<()> {
    let recipe = svc.add_recipe(
        session,
        &NewRecipe {
            title: title.to_string(),
            cooking_time: fields.time.clone().unwrap_or_default(),
            servings: fields.servings.clone().unwrap_or_default(),
            category: fields.parsed_category()?.unwrap_or(MealType::Dinner),
            ingredients: fields.parsed_ingredients()?,
            instructions: fields.instructions.clone().unwrap_or_default(),
            image_url: None,
        },
    )?;
    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        let id = recipe.id;
        let count = recipe.ingredients.len();
        println!("Added recipe: {} (id: {id}, {count} ingredients)", recipe.title);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_list(
    svc: &RecipeBoxService,
    session: &Session,
    query: RecipeQuery,
    json: bool,
) -> Result<()> {
    let page = svc.browse_recipes(session, &query)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }
    if page.recipes.is_empty() {
        eprintln!("No recipes found");
        return Ok(());
    }
    print_recipe_table(&page.recipes);
    println!(
        "Page {} of {} ({} recipes)",
        page.page, page.total_pages, page.total
    );
    Ok(())
}

pub(crate) fn build_query(
    search: Option<String>,
    favorites: bool,
    category: Option<String>,
    sort: Option<&str>,
    page: Option<usize>,
) -> Result<RecipeQuery> {
    let sort = sort.map(str::parse::<RecipeSort>).transpose()?;
    Ok(RecipeQuery {
        query: search,
        favorites_only: favorites,
        category,
        sort: sort.unwrap_or_default(),
        page,
    })
}

pub(crate) fn cmd_recipe_show(
    svc: &RecipeBoxService,
    session: &Session,
    id: i64,
    json: bool,
) -> Result<()> {
    let recipe = svc.get_recipe(session, id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
        return Ok(());
    }

    let star = if recipe.is_favorite { " *" } else { "" };
    println!("=== {}{star} ===", recipe.title);
    println!(
        "  {}  |  Time: {}  |  Servings: {}",
        recipe.category,
        non_empty(&recipe.cooking_time),
        non_empty(&recipe.servings)
    );
    if let Some(url) = &recipe.image_url {
        println!("  Image: {url}");
    }

    println!("\n  INGREDIENTS:");
    for ing in &recipe.ingredients {
        println!("    - {}", ing.display_string());
    }
    if !recipe.instructions.trim().is_empty() {
        println!("\n  INSTRUCTIONS:");
        for line in recipe.instructions.lines() {
            println!("    {line}");
        }
    }
    Ok(())
}

fn non_empty(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

pub(crate) fn cmd_recipe_edit(
    svc: &RecipeBoxService,
    session: &Session,
    id: i64,
    title: Option<String>,
    fields: &RecipeFields,
    json: bool,
) -> Result<()> {
    let ingredients = fields.parsed_ingredients()?;
    let update = RecipeUpdate {
        title,
        cooking_time: fields.time.clone(),
        servings: fields.servings.clone(),
        category: fields.parsed_category()?,
        ingredients: (!ingredients.is_empty()).then_some(ingredients),
        instructions: fields.instructions.clone(),
    };
    let recipe = svc.update_recipe(session, id, &update)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        println!("Updated recipe {id}: {}", recipe.title);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_delete(
    svc: &RecipeBoxService,
    session: &Session,
    id: i64,
    json: bool,
) -> Result<()> {
    if !svc.delete_recipe(session, id)? {
        exit_not_found(&format!("Recipe {id} not found"), json);
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted recipe {id}");
    }
    Ok(())
}

pub(crate) fn cmd_recipe_favorite(
    svc: &RecipeBoxService,
    session: &Session,
    id: i64,
    json: bool,
) -> Result<()> {
    let mut view = RecipeListView::new(svc.list_recipes(session)?);
    let Some(recipe) = view.toggle_favorite(id, |favorite| svc.set_favorite(session, id, favorite))?
    else {
        exit_not_found(&format!("Recipe {id} not found"), json);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else if recipe.is_favorite {
        println!("Marked {} as favorite", recipe.title);
    } else {
        println!("Removed {} from favorites", recipe.title);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_image(
    svc: &RecipeBoxService,
    session: &Session,
    id: i64,
    file: &std::path::Path,
    json: bool,
) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read file: {}", file.display()))?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image");
    let recipe = svc.attach_image(session, id, filename, &bytes)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        let url = recipe.image_url.as_deref().unwrap_or_default();
        println!("Uploaded image for {}: {url}", recipe.title);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_import(
    svc: &RecipeBoxService,
    session: &Session,
    file: &std::path::Path,
    title_override: Option<String>,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let input = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let (recipe_data, _report) = cooklang::parse(&input)
        .into_result()
        .map_err(|e| anyhow::anyhow!("Failed to parse Cooklang file: {e}"))?;

    let title = title_override
        .or_else(|| recipe_data.metadata.title().map(String::from))
        .or_else(|| file.file_stem().and_then(|s| s.to_str()).map(String::from))
        .context("Could not determine recipe title. Use --title to specify one")?;

    let servings = recipe_data
        .metadata
        .servings()
        .and_then(|s| s.as_number().map(|n| n.to_string()))
        .unwrap_or_default();

    let converter = cooklang::Converter::default();
    let ingredients: Vec<Ingredient> = recipe_data
        .group_ingredients(&converter)
        .iter()
        .map(cooklang_ingredient)
        .collect();

    if ingredients.is_empty() {
        bail!("No ingredients found in recipe");
    }

    let category = category
        .map(str::parse::<MealType>)
        .transpose()?
        .unwrap_or(MealType::Dinner);

    let recipe = svc.add_recipe(
        session,
        &NewRecipe {
            title,
            cooking_time: String::new(),
            servings,
            category,
            ingredients,
            instructions: instructions_from_cooklang(&input),
            image_url: None,
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        let count = recipe.ingredients.len();
        println!(
            "Imported recipe: {} (id: {}, {count} ingredients)",
            recipe.title, recipe.id
        );
    }
    Ok(())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

fn cooklang_ingredient(gi: &cooklang::ingredient_list::GroupedIngredient<'_>) -> Ingredient {
    let (qty, unit) = gi
        .quantity
        .iter()
        .next()
        .map_or((String::new(), String::new()), |q: &cooklang::Quantity| {
            let qty = match q.value() {
                cooklang::Value::Number(n) => format_number(n.value()),
                cooklang::Value::Range { start, .. } => format_number(start.value()),
                cooklang::Value::Text(t) => t.clone(),
            };
            (qty, q.unit().map(String::from).unwrap_or_default())
        });
    Ingredient {
        qty,
        unit,
        name: gi.ingredient.display_name().to_string(),
    }
}

/// Replace Cooklang markup in one step line with plain words.
///
/// `@olive oil{2%tbsp}` becomes "olive oil", `#pot` becomes "pot", and
/// `~{10%minutes}` becomes "10 minutes".
fn strip_markup(line: &str) -> String {
    let line = line.split_once("--").map_or(line, |(text, _)| text);
    let mut out = String::new();
    let mut rest = line;

    while let Some(pos) = rest.find(['@', '#', '~']) {
        out.push_str(&rest[..pos]);
        let is_timer = rest[pos..].starts_with('~');
        let after = &rest[pos + 1..];
        let next_marker = after.find(['@', '#', '~']).unwrap_or(after.len());

        let braced = after[..next_marker]
            .find('{')
            .and_then(|open| after[open..].find('}').map(|close| (open, open + close)));
        if let Some((open, close)) = braced {
            let name = &after[..open];
            out.push_str(name);
            if is_timer {
                let amount = after[open + 1..close].replace('%', " ");
                let amount = amount.trim();
                if !amount.is_empty() {
                    if !name.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(amount);
                }
            }
            rest = &after[close + 1..];
        } else {
            let end = after
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
                .unwrap_or(after.len());
            out.push_str(&after[..end]);
            rest = &after[end..];
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// Numbered plain-text steps from a Cooklang file. Blank lines separate steps.
fn instructions_from_cooklang(input: &str) -> String {
    let mut steps: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut in_front_matter = false;

    for (i, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line == "---" && (i == 0 || in_front_matter) {
            in_front_matter = !in_front_matter;
            continue;
        }
        if in_front_matter || line.starts_with(">>") || line.starts_with("--") {
            continue;
        }
        if line.is_empty() || line.starts_with('=') {
            if !current.is_empty() {
                steps.push(current.join(" "));
                current.clear();
            }
            continue;
        }
        let text = strip_markup(line);
        if !text.is_empty() {
            current.push(text);
        }
    }
    if !current.is_empty() {
        steps.push(current.join(" "));
    }

    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {step}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
