//! Response templates with weighted random variants.
//!
//! Templates live in a flat YAML mapping. A value is either one string or a
//! list of variants; a variant is a string (weight 1) or a `[text, weight]`
//! pair:
//!
//! ```yaml
//! greeting: Hello {{ name }}!
//! farewell:
//!   - Bye!
//!   - ["See you soon, {{ name }}.", 2]
//! ```
//!
//! Rendering picks one variant and substitutes `{{ name }}` placeholders.

use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde_yaml::Value;

use dialogwire_core::TemplateError;

#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub text: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Templates {
    entries: BTreeMap<String, Vec<Variant>>,
}

impl Templates {
    /// Read and parse a templates file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, TemplateError> {
        let raw: BTreeMap<String, Value> =
            serde_yaml::from_str(content).map_err(|e| TemplateError::Parse(e.to_string()))?;

        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            let variants = parse_variants(&key, value)?;
            entries.insert(key, variants);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&[Variant]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Template keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render `key` with a fresh random choice among its variants.
    pub fn render(&self, key: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
        self.render_with(key, vars, &mut rand::rng())
    }

    pub fn render_with<R: Rng + ?Sized>(
        &self,
        key: &str,
        vars: &[(&str, &str)],
        rng: &mut R,
    ) -> Result<String, TemplateError> {
        let variants = self
            .entries
            .get(key)
            .ok_or_else(|| TemplateError::NotFound(key.to_owned()))?;
        let chosen = choose(key, variants, rng)?;
        Ok(substitute(&chosen.text, vars))
    }
}

fn invalid(key: &str, reason: &str) -> TemplateError {
    TemplateError::InvalidFormat {
        key: key.to_owned(),
        reason: reason.to_owned(),
    }
}

fn parse_variants(key: &str, value: Value) -> Result<Vec<Variant>, TemplateError> {
    match value {
        Value::String(text) => Ok(vec![Variant { text, weight: 1.0 }]),
        Value::Sequence(items) if items.is_empty() => Err(invalid(key, "variant list is empty")),
        Value::Sequence(items) => {
            let variants = items
                .into_iter()
                .map(|item| parse_variant(key, item))
                .collect::<Result<Vec<_>, _>>()?;
            let total: f64 = variants.iter().map(|v| v.weight).sum();
            if !total.is_finite() {
                return Err(invalid(key, "variant weights add up to infinity"));
            }
            Ok(variants)
        }
        _ => Err(invalid(
            key,
            "must be a string or a list of variants (nested templates are not supported)",
        )),
    }
}

fn parse_variant(key: &str, item: Value) -> Result<Variant, TemplateError> {
    const SHAPE: &str = "variants must be strings or [text, weight] pairs, \
                         perhaps a complex string is missing its quotes";

    match item {
        Value::String(text) => Ok(Variant { text, weight: 1.0 }),
        Value::Sequence(pair) => {
            let [Value::String(text), Value::Number(weight)] = pair.as_slice() else {
                return Err(invalid(key, SHAPE));
            };
            let weight = weight.as_f64().unwrap_or(0.0);
            if !(weight.is_finite() && weight > 0.0) {
                return Err(invalid(key, "variant weights must be positive"));
            }
            Ok(Variant {
                text: text.clone(),
                weight,
            })
        }
        _ => Err(invalid(key, SHAPE)),
    }
}

/// Weighted random choice.
fn choose<'a, R: Rng + ?Sized>(
    key: &str,
    variants: &'a [Variant],
    rng: &mut R,
) -> Result<&'a Variant, TemplateError> {
    variants
        .choose_weighted(rng, |v| v.weight)
        .map_err(|e| invalid(key, &format!("cannot pick a variant: {e}")))
}

/// Replace `{{ name }}` placeholders. Unknown names are left as they are.
pub fn substitute(text: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        let end = start + 2 + len;
        let name = rest[start + 2..end].trim();

        out.push_str(&rest[..start]);
        match vars.iter().find(|(k, _)| *k == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..end + 2]),
        }
        rest = &rest[end + 2..];
    }
    out.push_str(rest);
    out
}
