use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid callable reference '{reference}': {reason}")]
pub struct InvalidCallableRef {
    pub reference: String,
    pub reason: &'static str,
}

/// A `module.path:attribute.path` reference taken from a command manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callable {
    pub module: String,
    pub attributes: Vec<String>,
}

impl Callable {
    pub fn parse(reference: &str) -> Result<Self, InvalidCallableRef> {
        let invalid = |reason| InvalidCallableRef {
            reference: reference.to_string(),
            reason,
        };

        // Trailing `[extra, ...]` markers only matter to the installer.
        let target = match reference.split_once('[') {
            Some((head, tail)) => {
                if !tail.trim_end().ends_with(']') {
                    return Err(invalid("unterminated extras list"));
                }
                head
            }
            None => reference,
        };

        let Some((module, attributes)) = target.split_once(':') else {
            return Err(invalid("expected 'module:attribute'"));
        };
        let module = module.trim();
        let attributes = attributes.trim();

        if !dotted_identifiers(module) {
            return Err(invalid("module path is not a dotted identifier"));
        }
        if !dotted_identifiers(attributes) {
            return Err(invalid("attribute path is not a dotted identifier"));
        }

        Ok(Self {
            module: module.to_string(),
            attributes: attributes.split('.').map(str::to_string).collect(),
        })
    }

    pub fn attribute_path(&self) -> String {
        self.attributes.join(".")
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.attribute_path())
    }
}

fn dotted_identifiers(value: &str) -> bool {
    !value.is_empty() && value.split('.').all(is_identifier)
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_alphabetic()) && chars.all(|ch| ch == '_' || ch.is_alphanumeric())
}
