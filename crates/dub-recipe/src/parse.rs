//! JSON and SDL recipe parsers, both producing the same [`Recipe`] IR.

use std::collections::BTreeMap;

use dub_utils::StrictnessPolicy;
use dub_version::Constraint;
use serde_json::Value;

use crate::{
    error::{RecipeError, RecipeResult},
    platform::PlatformSuffix,
    types::{
        Configuration, Dependency, RawBuildBlock, RawFieldValue, Recipe, SubPackageDescriptor,
    },
};

const LIST_FIELDS: &[&str] = &[
    "dflags",
    "lflags",
    "libs",
    "importPaths",
    "stringImportPaths",
    "versions",
    "sourceFiles",
    "excludedSourceFiles",
    "copyFiles",
    "preBuildCommands",
    "postBuildCommands",
];

const KNOWN_ROOT_FIELDS: &[&str] = &[
    "name",
    "version",
    "description",
    "authors",
    "license",
    "dependencies",
    "configurations",
    "subPackages",
    "toolchainRequirements",
    "targetType",
    "mainSourceFile",
    "noDefaultFlags",
    "environments",
];

const KNOWN_CONFIG_FIELDS: &[&str] = &[
    "name",
    "platforms",
    "dependencies",
    "targetType",
    "mainSourceFile",
    "noDefaultFlags",
    "environments",
];

/// Recognized recipe filenames, in load precedence order.
pub const RECIPE_FILENAMES: &[&str] = &["dub.json", "dub.sdl", "package.json"];

/// Parses a recipe from its JSON dialect (`dub.json` / `package.json`).
pub fn parse_json(input: &str, policy: StrictnessPolicy) -> RecipeResult<Recipe> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| RecipeError::MalformedRecipe(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| RecipeError::MalformedRecipe("recipe root must be a JSON object".into()))?;

    let name = object
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RecipeError::MalformedRecipe("missing required field 'name'".into()))?
        .to_string();

    let mut recipe = Recipe::empty(name);
    recipe.version = object.get("version").and_then(Value::as_str).map(str::to_string);
    recipe.description = object.get("description").and_then(Value::as_str).map(str::to_string);
    recipe.license = object.get("license").and_then(Value::as_str).map(str::to_string);
    recipe.authors = object
        .get("authors")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    if let Some(deps) = object.get("dependencies").and_then(Value::as_object) {
        recipe.dependencies = parse_dependencies_object(deps)?;
    }

    if let Some(configs) = object.get("configurations").and_then(Value::as_array) {
        for config_value in configs {
            recipe.configurations.push(parse_configuration(config_value, policy)?);
        }
    }

    if let Some(subs) = object.get("subPackages").and_then(Value::as_array) {
        for sub in subs {
            recipe.sub_packages.push(parse_sub_package(sub)?);
        }
    }

    if let Some(toolchain) = object.get("toolchainRequirements").and_then(Value::as_object) {
        for (k, v) in toolchain {
            if let Some(v) = v.as_str() {
                recipe.tool_chain_requirements.insert(k.clone(), v.to_string());
            }
        }
    }

    recipe.root_block = parse_build_block(object)?;

    check_unknown_fields(object.keys(), KNOWN_ROOT_FIELDS, policy)?;

    Ok(recipe)
}

fn parse_dependencies_object(map: &serde_json::Map<String, Value>) -> RecipeResult<Vec<Dependency>> {
    map.iter().map(|(name, spec)| parse_dependency(name, spec)).collect()
}

fn parse_dependency(name: &str, spec: &Value) -> RecipeResult<Dependency> {
    let mut constraint = match spec {
        Value::String(s) => Constraint::parse(s)?,
        Value::Object(map) => {
            if let Some(version) = map.get("version").and_then(Value::as_str) {
                Constraint::parse(version)?
            } else {
                Constraint::unbounded()
            }
        }
        _ => {
            return Err(RecipeError::MalformedRecipe(format!(
                "dependency '{name}' has an invalid specification"
            )))
        }
    };

    if let Value::Object(map) = spec {
        if let Some(path) = map.get("path").and_then(Value::as_str) {
            constraint.path = Some(path.into());
        }
        if let Some(sub) = map.get("subConfiguration").and_then(Value::as_str) {
            constraint.sub_configuration = Some(sub.to_string());
        }
        constraint.optional = map.get("optional").and_then(Value::as_bool).unwrap_or(false);
        constraint.default = map.get("default").and_then(Value::as_bool).unwrap_or(false);
    }

    Ok(Dependency {
        name: name.to_string(),
        constraint,
    })
}

fn parse_configuration(value: &Value, policy: StrictnessPolicy) -> RecipeResult<Configuration> {
    let object = value
        .as_object()
        .ok_or_else(|| RecipeError::MalformedRecipe("configuration entry must be an object".into()))?;
    let name = object
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RecipeError::MalformedRecipe("configuration missing 'name'".into()))?
        .to_string();

    let platforms = object
        .get("platforms")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    let dependencies = match object.get("dependencies").and_then(Value::as_object) {
        Some(deps) => parse_dependencies_object(deps)?,
        None => Vec::new(),
    };

    let block = parse_build_block(object)?;
    check_unknown_fields(object.keys(), KNOWN_CONFIG_FIELDS, policy)?;

    Ok(Configuration { name, platforms, block, dependencies })
}

fn parse_sub_package(value: &Value) -> RecipeResult<SubPackageDescriptor> {
    match value {
        Value::String(path) => Ok(SubPackageDescriptor::Path(path.clone())),
        Value::Object(object) => {
            if let Some(path) = object.get("path").and_then(Value::as_str) {
                Ok(SubPackageDescriptor::Path(path.to_string()))
            } else {
                let name = object
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RecipeError::MalformedRecipe("inline sub-package missing 'name'".into()))?
                    .to_string();
                let mut inline = Recipe::empty(name);
                inline.dependencies = if let Some(deps) = object.get("dependencies").and_then(Value::as_object) {
                    deps.iter()
                        .map(|(n, s)| parse_dependency(n, s))
                        .collect::<RecipeResult<Vec<_>>>()?
                } else {
                    Vec::new()
                };
                inline.root_block = parse_build_block(object)?;
                Ok(SubPackageDescriptor::Inline(Box::new(inline)))
            }
        }
        _ => Err(RecipeError::MalformedRecipe("invalid sub-package entry".into())),
    }
}

fn parse_build_block(object: &serde_json::Map<String, Value>) -> RecipeResult<RawBuildBlock> {
    let mut block = RawBuildBlock::default();

    for (key, value) in object {
        let (base_name, _) = key.split_once('-').unwrap_or((key.as_str(), ""));
        let known_base = LIST_FIELDS.contains(&base_name)
            || matches!(base_name, "environments" | "mainSourceFile" | "targetType" | "noDefaultFlags");
        if !known_base {
            continue;
        }

        let (field_name, suffix) = PlatformSuffix::split_key(key);

        let field_value = if base_name == "environments" {
            let map: BTreeMap<String, String> = value
                .as_object()
                .map(|m| {
                    m.iter()
                        .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                        .collect()
                })
                .unwrap_or_default();
            RawFieldValue::Map(map)
        } else if base_name == "noDefaultFlags" {
            RawFieldValue::Bool(value.as_bool().unwrap_or(false))
        } else if base_name == "mainSourceFile" || base_name == "targetType" {
            RawFieldValue::Scalar(value.as_str().unwrap_or_default().to_string())
        } else {
            let items = match value {
                Value::Array(arr) => arr.iter().filter_map(Value::as_str).map(str::to_string).collect(),
                Value::String(s) => vec![s.clone()],
                _ => Vec::new(),
            };
            RawFieldValue::List(items)
        };

        block.fields.push((field_name.to_string(), suffix, field_value));
    }

    Ok(block)
}

fn check_unknown_fields<'a>(
    keys: impl Iterator<Item = &'a String>,
    known: &[&str],
    policy: StrictnessPolicy,
) -> RecipeResult<()> {
    if policy == StrictnessPolicy::Ignore {
        return Ok(());
    }

    for key in keys {
        let base = key.split('-').next().unwrap_or(key);
        if known.contains(&base) || LIST_FIELDS.contains(&base) {
            continue;
        }
        match policy {
            StrictnessPolicy::Reject => {
                return Err(RecipeError::UnknownRecipeField { field: key.clone() })
            }
            StrictnessPolicy::Warn => {
                tracing::warn!(field = %key, "unknown recipe field");
            }
            StrictnessPolicy::Ignore => unreachable!(),
        }
    }

    Ok(())
}

/// Parses a recipe from the SDL dialect (`dub.sdl`): one statement per
/// logical line, `name "value"` or `name value` pairs, with `configuration
/// "name" { ... }` and `subPackage { ... }` braces for nested blocks.
pub fn parse_sdl(input: &str, policy: StrictnessPolicy) -> RecipeResult<Recipe> {
    let statements = tokenize_sdl(input)?;
    let mut recipe = Recipe::empty("");
    let mut cursor = 0;

    parse_sdl_body(&statements, &mut cursor, &mut recipe, policy)?;

    if recipe.name.is_empty() {
        return Err(RecipeError::MalformedRecipe("missing required field 'name'".into()));
    }

    Ok(recipe)
}

#[derive(Debug, Clone)]
enum SdlStatement {
    KeyValue { key: String, args: Vec<String> },
    BlockStart { key: String, args: Vec<String> },
    BlockEnd,
}

fn tokenize_sdl(input: &str) -> RecipeResult<Vec<SdlStatement>> {
    let mut statements = Vec::new();

    for raw_line in input.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if line == "}" {
            statements.push(SdlStatement::BlockEnd);
            continue;
        }

        let (body, opens_block) = if let Some(stripped) = line.strip_suffix('{') {
            (stripped.trim(), true)
        } else {
            (line, false)
        };

        let tokens = split_sdl_tokens(body)?;
        let Some((key, args)) = tokens.split_first() else {
            continue;
        };

        if opens_block {
            statements.push(SdlStatement::BlockStart {
                key: key.clone(),
                args: args.to_vec(),
            });
        } else {
            statements.push(SdlStatement::KeyValue {
                key: key.clone(),
                args: args.to_vec(),
            });
        }
    }

    Ok(statements)
}

fn split_sdl_tokens(line: &str) -> RecipeResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '"' {
                    closed = true;
                    break;
                }
                value.push(c);
            }
            if !closed {
                return Err(RecipeError::MalformedRecipe(format!("unterminated string in '{line}'")));
            }
            tokens.push(value);
        } else {
            let mut value = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                value.push(c);
                chars.next();
            }
            tokens.push(value);
        }
    }

    Ok(tokens)
}

fn parse_sdl_body(
    statements: &[SdlStatement],
    cursor: &mut usize,
    recipe: &mut Recipe,
    policy: StrictnessPolicy,
) -> RecipeResult<()> {
    while *cursor < statements.len() {
        match &statements[*cursor] {
            SdlStatement::BlockEnd => {
                *cursor += 1;
                return Ok(());
            }
            SdlStatement::KeyValue { key, args } => {
                apply_sdl_statement(recipe, key, args, policy)?;
                *cursor += 1;
            }
            SdlStatement::BlockStart { key, args } if key == "configuration" => {
                let name = args
                    .first()
                    .ok_or_else(|| RecipeError::MalformedRecipe("configuration block missing name".into()))?
                    .clone();
                *cursor += 1;

                let mut config_recipe = Recipe::empty(name.clone());
                parse_sdl_body(statements, cursor, &mut config_recipe, policy)?;

                recipe.configurations.push(Configuration {
                    name,
                    platforms: Vec::new(),
                    block: config_recipe.root_block,
                    dependencies: config_recipe.dependencies,
                });
            }
            SdlStatement::BlockStart { .. } => {
                // Unrecognized block kinds are skipped wholesale.
                *cursor += 1;
                let mut depth = 1;
                while *cursor < statements.len() && depth > 0 {
                    match &statements[*cursor] {
                        SdlStatement::BlockStart { .. } => depth += 1,
                        SdlStatement::BlockEnd => depth -= 1,
                        SdlStatement::KeyValue { .. } => {}
                    }
                    *cursor += 1;
                }
            }
        }
    }

    Ok(())
}

fn apply_sdl_statement(
    recipe: &mut Recipe,
    key: &str,
    args: &[String],
    policy: StrictnessPolicy,
) -> RecipeResult<()> {
    let (base_name, suffix_text) = key.split_once('-').unwrap_or((key, ""));
    let _ = suffix_text;

    match base_name {
        "name" => recipe.name = args.first().cloned().unwrap_or_default(),
        "version" => recipe.version = args.first().cloned(),
        "description" => recipe.description = args.first().cloned(),
        "license" => recipe.license = args.first().cloned(),
        "authors" => recipe.authors.extend(args.iter().cloned()),
        "dependency" => {
            let name = args
                .first()
                .ok_or_else(|| RecipeError::MalformedRecipe("dependency missing name".into()))?
                .clone();
            let version_arg = args.iter().skip(1).find_map(|a| a.strip_prefix("version=").map(str::to_string));
            let path_arg = args.iter().skip(1).find_map(|a| a.strip_prefix("path=").map(str::to_string));
            let optional_arg = args.iter().any(|a| a == "optional=true");

            let mut constraint = match &version_arg {
                Some(v) => Constraint::parse(v)?,
                None => Constraint::unbounded(),
            };
            constraint.path = path_arg.map(Into::into);
            constraint.optional = optional_arg;

            recipe.dependencies.push(Dependency { name, constraint });
        }
        _ if LIST_FIELDS.contains(&base_name) => {
            let (field_name, suffix) = PlatformSuffix::split_key(key);
            recipe
                .root_block
                .fields
                .push((field_name.to_string(), suffix, RawFieldValue::List(args.to_vec())));
        }
        "targetType" => {
            let (field_name, suffix) = PlatformSuffix::split_key(key);
            recipe.root_block.fields.push((
                field_name.to_string(),
                suffix,
                RawFieldValue::Scalar(args.first().cloned().unwrap_or_default()),
            ));
        }
        _ => {
            if policy == StrictnessPolicy::Reject {
                return Err(RecipeError::UnknownRecipeField { field: key.to_string() });
            }
            if policy == StrictnessPolicy::Warn {
                tracing::warn!(field = %key, "unknown recipe field");
            }
        }
    }

    Ok(())
}
