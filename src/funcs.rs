//! Helpers registered on every template: format conversion and a set of
//! string and list utilities modelled on the usual chart-template library.
//!
//! Encoders never fail inside a template: `toYaml`/`toJson`/`toYamlPretty`
//! render an empty string on error and `toToml` renders the encoder's message.
//! `mustToYaml`/`mustToJson` fail the render instead. Decoders return a mapping
//! `{Error: <message>}` (or a one-element list for the `*Array` variants) so
//! templates can inspect the failure.
//!
//! In strict mode every helper refuses an argument that names a value absent
//! from the data, reporting the missing key instead of running the helper.

use std::fmt::Display;

use base64::{Engine, engine::general_purpose::STANDARD};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, JsonRender, Output, RenderContext,
    RenderError, RenderErrorReason, ScopedJson, handlebars_helper,
};
use heck::{ToKebabCase, ToSnakeCase, ToUpperCamelCase};
use serde_json::{Map, Value as Json, json};

use crate::types::RenderMode;
use crate::value::Value;

handlebars_helper!(toYaml: |v: Json| encode_yaml(v).unwrap_or_default());
handlebars_helper!(toYamlPretty: |v: Json| encode_yaml_pretty(v));
handlebars_helper!(toJson: |v: Json| encode_json(v).unwrap_or_default());
handlebars_helper!(toPrettyJson: |v: Json| serde_json::to_string_pretty(v).unwrap_or_default());
handlebars_helper!(toToml: |v: Json| toml::to_string(v).unwrap_or_else(|e| e.to_string()));
handlebars_helper!(fromYaml: |s: str| decode_mapping(serde_yaml::from_str(s)));
handlebars_helper!(fromYamlArray: |s: str| decode_sequence(serde_yaml::from_str(s)));
handlebars_helper!(fromJson: |s: str| decode_mapping(serde_json::from_str(s)));
handlebars_helper!(fromJsonArray: |s: str| decode_sequence(serde_json::from_str(s)));
handlebars_helper!(fromToml: |s: str| decode_mapping(toml::from_str(s)));

handlebars_helper!(upper: |s: str| s.to_uppercase());
handlebars_helper!(lower: |s: str| s.to_lowercase());
handlebars_helper!(title: |s: str| title_case(s));
handlebars_helper!(camelcase: |s: str| s.to_upper_camel_case());
handlebars_helper!(snakecase: |s: str| s.to_snake_case());
handlebars_helper!(kebabcase: |s: str| s.to_kebab_case());
handlebars_helper!(trim: |s: str| s.trim().to_string());
handlebars_helper!(trimPrefix: |prefix: str, s: str| {
    s.strip_prefix(prefix).unwrap_or(s).to_owned()
});
handlebars_helper!(trimSuffix: |suffix: str, s: str| {
    s.strip_suffix(suffix).unwrap_or(s).to_owned()
});
handlebars_helper!(hasPrefix: |prefix: str, s: str| s.starts_with(prefix));
handlebars_helper!(hasSuffix: |suffix: str, s: str| s.ends_with(suffix));
handlebars_helper!(contains: |needle: str, s: str| s.contains(needle));
handlebars_helper!(replace: |old: str, new: str, s: str| s.replace(old, new));
handlebars_helper!(repeat: |count: u64, s: str| s.repeat(usize::try_from(count).unwrap_or(0)));
handlebars_helper!(quote: |v: Json| format!("\"{}\"", v.render()));
handlebars_helper!(squote: |v: Json| format!("'{}'", v.render()));
handlebars_helper!(indent: |width: u64, s: str| indent_lines(s, width));
handlebars_helper!(nindent: |width: u64, s: str| format!("\n{}", indent_lines(s, width)));
handlebars_helper!(b64enc: |s: str| STANDARD.encode(s));
handlebars_helper!(b64dec: |s: str| decode_base64(s));
handlebars_helper!(toString: |v: Json| v.render());

handlebars_helper!(join: |sep: str, items: array| join_items(sep, items));
handlebars_helper!(splitList: |sep: str, s: str| s.split(sep).collect::<Vec<_>>());
handlebars_helper!(empty: |v: Json| is_empty(v));
handlebars_helper!(default: |fallback: Json, v: Json| pick_default(fallback, v));

/// Register the full helper set on `registry`.
pub fn register(registry: &mut Handlebars<'static>, mode: RenderMode) {
    let mut helpers = Helpers { registry, mode };

    helpers.add("toYaml", Box::new(toYaml));
    helpers.add("toYamlPretty", Box::new(toYamlPretty));
    helpers.add("mustToYaml", Box::new(MustEncode::new("mustToYaml", encode_yaml_strict)));
    helpers.add("toJson", Box::new(toJson));
    helpers.add("mustToJson", Box::new(MustEncode::new("mustToJson", encode_json)));
    helpers.add("toPrettyJson", Box::new(toPrettyJson));
    helpers.add("toToml", Box::new(toToml));
    helpers.add("fromYaml", Box::new(fromYaml));
    helpers.add("fromYamlArray", Box::new(fromYamlArray));
    helpers.add("fromJson", Box::new(fromJson));
    helpers.add("fromJsonArray", Box::new(fromJsonArray));
    helpers.add("fromToml", Box::new(fromToml));

    helpers.add("upper", Box::new(upper));
    helpers.add("lower", Box::new(lower));
    helpers.add("title", Box::new(title));
    helpers.add("camelcase", Box::new(camelcase));
    helpers.add("snakecase", Box::new(snakecase));
    helpers.add("kebabcase", Box::new(kebabcase));
    helpers.add("trim", Box::new(trim));
    helpers.add("trimPrefix", Box::new(trimPrefix));
    helpers.add("trimSuffix", Box::new(trimSuffix));
    helpers.add("hasPrefix", Box::new(hasPrefix));
    helpers.add("hasSuffix", Box::new(hasSuffix));
    helpers.add("contains", Box::new(contains));
    helpers.add("replace", Box::new(replace));
    helpers.add("repeat", Box::new(repeat));
    helpers.add("quote", Box::new(quote));
    helpers.add("squote", Box::new(squote));
    helpers.add("indent", Box::new(indent));
    helpers.add("nindent", Box::new(nindent));
    helpers.add("b64enc", Box::new(b64enc));
    helpers.add("b64dec", Box::new(b64dec));
    helpers.add("toString", Box::new(toString));

    helpers.add("join", Box::new(join));
    helpers.add("splitList", Box::new(splitList));
    helpers.add("empty", Box::new(empty));
    helpers.add("default", Box::new(default));
    helpers.add("required", Box::new(required));
}

struct Helpers<'a> {
    registry: &'a mut Handlebars<'static>,
    mode: RenderMode,
}

impl Helpers<'_> {
    fn add(&mut self, name: &str, helper: Box<dyn HelperDef + Send + Sync>) {
        let helper: Box<dyn HelperDef + Send + Sync> = match self.mode {
            RenderMode::Strict => Box::new(StrictParams(helper)),
            RenderMode::Lenient => helper,
        };
        self.registry.register_helper(name, helper);
    }
}

/// Strict-mode guard: a parameter that names an absent value fails the call
/// with the path of that value, before the helper runs.
struct StrictParams(Box<dyn HelperDef + Send + Sync>);

impl HelperDef for StrictParams {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        check_params(h)?;
        self.0.call_inner(h, r, ctx, rc)
    }

    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        check_params(h)?;
        self.0.call(h, r, ctx, rc, out)
    }
}

fn check_params(h: &Helper<'_>) -> Result<(), RenderError> {
    let missing = h
        .params()
        .iter()
        .chain(h.hash().values())
        .find(|param| param.is_value_missing());

    match missing {
        Some(param) => {
            Err(RenderErrorReason::MissingVariable(param.relative_path().cloned()).into())
        }
        None => Ok(()),
    }
}

/// Encoder whose failure aborts the render, named in the error message.
struct MustEncode {
    name: &'static str,
    encode: fn(&Json) -> Result<String, String>,
}

impl MustEncode {
    fn new(name: &'static str, encode: fn(&Json) -> Result<String, String>) -> Self {
        Self { name, encode }
    }
}

impl HelperDef for MustEncode {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let value = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex(self.name, 0))?
            .value();
        let text = (self.encode)(value).map_err(|e| render_failure(self.name, e))?;
        Ok(ScopedJson::Derived(Json::String(text)))
    }
}

/// `{{required "message" value}}`: render `value`, or fail with `message` when
/// it is null or an empty string.
fn required(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let message = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("required", 0))?
        .value()
        .render();
    let value = h
        .param(1)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("required", 1))?
        .value();

    match value {
        Json::Null => Err(RenderErrorReason::Other(message).into()),
        Json::String(s) if s.is_empty() => Err(RenderErrorReason::Other(message).into()),
        other => {
            out.write(&other.render())?;
            Ok(())
        }
    }
}

fn render_failure(helper: &str, err: impl Display) -> RenderError {
    RenderErrorReason::Other(format!("{helper}: {err}")).into()
}

fn encode_yaml_strict(v: &Json) -> Result<String, String> {
    let text = serde_yaml::to_string(v).map_err(|e| e.to_string())?;
    Ok(text.trim_end_matches('\n').to_string())
}

fn encode_yaml(v: &Json) -> Option<String> {
    encode_yaml_strict(v).ok()
}

fn encode_json(v: &Json) -> Result<String, String> {
    serde_json::to_string(v).map_err(|e| e.to_string())
}

/// YAML with two-space indentation throughout, including list items nested
/// under a key.
fn encode_yaml_pretty(v: &Json) -> String {
    let mut out = String::new();
    if !write_block(v, 0, &mut out) {
        out.push_str(&yaml_scalar(v));
    }
    out.trim_end_matches('\n').to_string()
}

/// Write a non-empty mapping or sequence indented by `depth` spaces. Returns
/// false, writing nothing, for anything rendered inline.
fn write_block(v: &Json, depth: usize, out: &mut String) -> bool {
    match v {
        Json::Object(map) if !map.is_empty() => write_mapping(map, depth, out),
        Json::Array(items) if !items.is_empty() => write_sequence(items, depth, out),
        _ => return false,
    }
    true
}

fn write_mapping(map: &Map<String, Json>, depth: usize, out: &mut String) {
    let pad = " ".repeat(depth);
    for (key, value) in map {
        let key = yaml_scalar(&Json::String(key.clone()));
        let mut nested = String::new();
        if write_block(value, depth + 2, &mut nested) {
            out.push_str(&format!("{pad}{key}:\n{nested}"));
        } else {
            out.push_str(&format!("{pad}{key}: {}\n", yaml_scalar(value)));
        }
    }
}

fn write_sequence(items: &[Json], depth: usize, out: &mut String) {
    let pad = " ".repeat(depth);
    for item in items {
        let mut nested = String::new();
        if write_block(item, depth + 2, &mut nested) {
            out.push_str(&format!("{pad}- {}", nested.trim_start_matches(' ')));
        } else {
            out.push_str(&format!("{pad}- {}\n", yaml_scalar(item)));
        }
    }
}

fn yaml_scalar(v: &Json) -> String {
    match v {
        Json::String(s) if s.contains('\n') => v.to_string(),
        _ => encode_yaml(v).unwrap_or_else(|| v.render()),
    }
}

fn decode_mapping<E: Display>(decoded: Result<Value, E>) -> Json {
    match decoded {
        Ok(value @ Value::Tree(_)) => serde_json::to_value(value).unwrap_or_default(),
        Ok(Value::Null) => json!({}),
        Ok(other) => json!({ "Error": format!("expected a mapping, found {}", other.type_name()) }),
        Err(e) => json!({ "Error": e.to_string() }),
    }
}

fn decode_sequence<E: Display>(decoded: Result<Value, E>) -> Json {
    match decoded {
        Ok(value @ Value::Sequence(_)) => serde_json::to_value(value).unwrap_or_default(),
        Ok(Value::Null) => json!([]),
        Ok(other) => json!([format!("expected a sequence, found {}", other.type_name())]),
        Err(e) => json!([e.to_string()]),
    }
}

/// Decoded text, or the decoder's message when `s` is not valid base64 UTF-8.
fn decode_base64(s: &str) -> String {
    STANDARD
        .decode(s)
        .map_err(|e| e.to_string())
        .and_then(|bytes| String::from_utf8(bytes).map_err(|e| e.to_string()))
        .unwrap_or_else(|message| message)
}

fn indent_lines(s: &str, width: u64) -> String {
    let pad = " ".repeat(usize::try_from(width).unwrap_or(0));
    s.split('\n')
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Upper-case the first letter of every whitespace-separated word.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = c.is_whitespace();
    }
    out
}

fn join_items(sep: &str, items: &[Json]) -> String {
    items
        .iter()
        .map(|item| item.render())
        .collect::<Vec<_>>()
        .join(sep)
}

fn pick_default(fallback: &Json, v: &Json) -> Json {
    if is_empty(v) { fallback.clone() } else { v.clone() }
}

/// Empty in the sense `default` and `empty` use: null, false, zero, or an
/// empty string, list or mapping.
fn is_empty(v: &Json) -> bool {
    match v {
        Json::Null => true,
        Json::Bool(b) => !b,
        Json::Number(n) => n.as_f64() == Some(0.0),
        Json::String(s) => s.is_empty(),
        Json::Array(items) => items.is_empty(),
        Json::Object(map) => map.is_empty(),
    }
}
