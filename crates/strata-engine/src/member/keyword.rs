//! Declaration key classifier
//!
//! Turns a raw declaration entry such as `("protected virtual render", body)`
//! into a [`MemberDescriptor`]. Keys are lexed once here with logos; nothing
//! past this boundary looks at keyword strings again.

use logos::Logos;

use super::{MemberDescriptor, MemberKind, MemberValue, Modifiers, ProxyTarget, RawValue, Visibility};
use crate::error::DeclarationError;
use crate::value::Value;

/// Logos-based token enum for declaration keys
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum KeyToken {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[token("public")]
    Public,
    #[token("protected")]
    Protected,
    #[token("private")]
    Private,
    #[token("static")]
    Static,
    #[token("const")]
    Const,
    #[token("abstract")]
    Abstract,
    #[token("virtual")]
    Virtual,
    #[token("override")]
    Override,
    #[token("proxy")]
    Proxy,
    #[token("weak")]
    Weak,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,
}

/// Recognized member keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `public`
    Public,
    /// `protected`
    Protected,
    /// `private`
    Private,
    /// `static`
    Static,
    /// `const`
    Const,
    /// `abstract`
    Abstract,
    /// `virtual`
    Virtual,
    /// `override`
    Override,
    /// `proxy`
    Proxy,
    /// `weak`
    Weak,
}

impl Keyword {
    /// Keyword spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Public => "public",
            Keyword::Protected => "protected",
            Keyword::Private => "private",
            Keyword::Static => "static",
            Keyword::Const => "const",
            Keyword::Abstract => "abstract",
            Keyword::Virtual => "virtual",
            Keyword::Override => "override",
            Keyword::Proxy => "proxy",
            Keyword::Weak => "weak",
        }
    }

    fn from_token(token: KeyToken) -> Option<Self> {
        match token {
            KeyToken::Public => Some(Keyword::Public),
            KeyToken::Protected => Some(Keyword::Protected),
            KeyToken::Private => Some(Keyword::Private),
            KeyToken::Static => Some(Keyword::Static),
            KeyToken::Const => Some(Keyword::Const),
            KeyToken::Abstract => Some(Keyword::Abstract),
            KeyToken::Virtual => Some(Keyword::Virtual),
            KeyToken::Override => Some(Keyword::Override),
            KeyToken::Proxy => Some(Keyword::Proxy),
            KeyToken::Weak => Some(Keyword::Weak),
            KeyToken::Whitespace | KeyToken::Ident => None,
        }
    }
}

/// Split a key into its keywords and trailing member name
pub fn parse_key(key: &str) -> Result<(Vec<Keyword>, String), DeclarationError> {
    let mut lexer = KeyToken::lexer(key);
    let mut words: Vec<(Option<Keyword>, &str)> = Vec::new();

    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => words.push((Keyword::from_token(token), lexer.slice())),
            Err(()) => {
                return Err(DeclarationError::MalformedKey { key: key.to_string() });
            }
        }
    }

    let name = match words.pop() {
        Some((None, name)) => name.to_string(),
        _ => return Err(DeclarationError::MissingName { key: key.to_string() }),
    };

    let mut keywords = Vec::with_capacity(words.len());
    for (keyword, text) in words {
        match keyword {
            Some(keyword) => keywords.push(keyword),
            None => {
                return Err(DeclarationError::UnknownKeyword {
                    keyword: text.to_string(),
                    member: name,
                });
            }
        }
    }

    Ok((keywords, name))
}

/// Classify a raw declaration entry
///
/// Only lexical and shape errors are reported here. Modifier combinations that
/// depend on the member kind or on a supertype member are left to the validator.
pub fn classify(key: &str, raw: RawValue) -> Result<MemberDescriptor, DeclarationError> {
    let (keywords, name) = parse_key(key)?;

    let mut visibility: Option<Visibility> = None;
    let mut modifiers = Modifiers::default();
    let mut seen: Vec<Keyword> = Vec::with_capacity(keywords.len());

    for keyword in keywords {
        if seen.contains(&keyword) {
            return Err(DeclarationError::DuplicateKeyword {
                keyword: keyword.as_str().to_string(),
                member: name,
            });
        }
        seen.push(keyword);

        let access = match keyword {
            Keyword::Public => Some(Visibility::Public),
            Keyword::Protected => Some(Visibility::Protected),
            Keyword::Private => Some(Visibility::Private),
            Keyword::Static => {
                modifiers.is_static = true;
                None
            }
            Keyword::Const => {
                modifiers.is_const = true;
                None
            }
            Keyword::Abstract => {
                modifiers.is_abstract = true;
                None
            }
            Keyword::Virtual => {
                modifiers.is_virtual = true;
                None
            }
            Keyword::Override => {
                modifiers.is_override = true;
                None
            }
            Keyword::Proxy => {
                modifiers.is_proxy = true;
                None
            }
            Keyword::Weak => {
                modifiers.is_weak = true;
                None
            }
        };

        if let Some(access) = access {
            if visibility.is_some() {
                return Err(DeclarationError::MultipleAccessModifiers { member: name });
            }
            visibility = Some(access);
        }
    }

    let (kind, value, arity) = classify_value(&name, &mut modifiers, raw)?;

    Ok(MemberDescriptor {
        name,
        kind,
        visibility: visibility.unwrap_or_default(),
        modifiers,
        value,
        arity,
    })
}

fn classify_value(
    name: &str,
    modifiers: &mut Modifiers,
    raw: RawValue,
) -> Result<(MemberKind, MemberValue, Option<usize>), DeclarationError> {
    if modifiers.is_proxy {
        return match raw {
            RawValue::Value(Value::String(dest)) => Ok((
                MemberKind::Method,
                MemberValue::Proxy(ProxyTarget {
                    property: dest.to_string(),
                    method: name.to_string(),
                    via_trait: false,
                }),
                None,
            )),
            _ => Err(DeclarationError::InvalidValue {
                member: name.to_string(),
                reason: "proxy destination must be a property name string".to_string(),
            }),
        };
    }

    match raw {
        RawValue::Params(params) => {
            // a bare signature is always abstract
            modifiers.is_abstract = true;
            let arity = Some(params.len());
            Ok((MemberKind::Method, MemberValue::Abstract(params), arity))
        }
        RawValue::Method(method) => {
            if modifiers.is_abstract && !modifiers.is_override {
                return Err(DeclarationError::InvalidValue {
                    member: name.to_string(),
                    reason: "abstract methods declare a parameter list, not a body".to_string(),
                });
            }
            let arity = Some(method.arity);
            Ok((MemberKind::Method, MemberValue::Method(method), arity))
        }
        RawValue::Accessor(accessor) => {
            let kind = match (accessor.has_getter(), accessor.has_setter()) {
                (true, _) => MemberKind::Getter,
                (false, true) => MemberKind::Setter,
                (false, false) => {
                    return Err(DeclarationError::InvalidValue {
                        member: name.to_string(),
                        reason: "accessor requires a getter or a setter".to_string(),
                    });
                }
            };
            Ok((kind, MemberValue::Accessor(accessor), None))
        }
        RawValue::Value(value) => Ok((MemberKind::Property, MemberValue::Property(value), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::Method;

    #[test]
    fn test_parse_key_splits_keywords_and_name() {
        let (keywords, name) = parse_key("protected static counter").unwrap();
        assert_eq!(keywords, vec![Keyword::Protected, Keyword::Static]);
        assert_eq!(name, "counter");
    }

    #[test]
    fn test_parse_key_identifier_prefixed_by_keyword() {
        let (keywords, name) = parse_key("publicity").unwrap();
        assert!(keywords.is_empty());
        assert_eq!(name, "publicity");
    }

    #[test]
    fn test_parse_key_rejects_missing_name() {
        assert!(matches!(parse_key("public static"), Err(DeclarationError::MissingName { .. })));
        assert!(matches!(parse_key("   "), Err(DeclarationError::MissingName { .. })));
    }

    #[test]
    fn test_parse_key_rejects_garbage() {
        assert!(matches!(parse_key("public foo-bar"), Err(DeclarationError::MalformedKey { .. })));
    }

    #[test]
    fn test_unknown_keyword_names_member() {
        let err = classify("publik foo", RawValue::Value(Value::Null)).unwrap_err();
        match err {
            DeclarationError::UnknownKeyword { keyword, member } => {
                assert_eq!(keyword, "publik");
                assert_eq!(member, "foo");
            }
            other => panic!("Expected UnknownKeyword, got {:?}", other),
        }
    }

    #[test]
    fn test_default_visibility_is_public() {
        let desc = classify("foo", RawValue::Value(Value::from(1))).unwrap();
        assert_eq!(desc.visibility, Visibility::Public);
        assert_eq!(desc.kind, MemberKind::Property);
    }

    #[test]
    fn test_multiple_access_modifiers() {
        let err = classify("public private foo", RawValue::Value(Value::Null)).unwrap_err();
        assert!(matches!(err, DeclarationError::MultipleAccessModifiers { .. }));
    }

    #[test]
    fn test_duplicate_keyword() {
        let err = classify("static static foo", RawValue::Value(Value::Null)).unwrap_err();
        assert!(matches!(err, DeclarationError::DuplicateKeyword { .. }));
    }

    #[test]
    fn test_proxy_requires_string() {
        let desc = classify("proxy render", RawValue::Value(Value::from("view"))).unwrap();
        match &desc.value {
            MemberValue::Proxy(target) => {
                assert_eq!(target.property, "view");
                assert_eq!(target.method, "render");
            }
            other => panic!("Expected proxy, got {:?}", other),
        }
        assert_eq!(desc.arity, None);

        let err = classify("proxy render", RawValue::Value(Value::from(1))).unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidValue { .. }));
    }

    #[test]
    fn test_signature_is_abstract() {
        let desc = classify("protected draw", RawValue::params(&["x", "y"])).unwrap();
        assert!(desc.modifiers.is_abstract);
        assert_eq!(desc.arity, Some(2));
        assert_eq!(desc.visibility, Visibility::Protected);
    }

    #[test]
    fn test_abstract_body_requires_override() {
        let body = Method::new(0, |_, _| Ok(Value::Undefined));
        let err = classify("abstract draw", RawValue::Method(body.clone())).unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidValue { .. }));

        let desc = classify("abstract override draw", RawValue::Method(body)).unwrap();
        assert!(desc.is_abstract_override());
    }
}
