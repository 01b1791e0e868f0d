use lazy_static::lazy_static;
use regex::Regex;

use crate::error::StitchError;
use crate::path::TypePath;
use crate::tokenizer::{tokenize_schema, Token};
use crate::types::{
    EnumDecl, EnumValue, ExtendDecl, ExtensionRange, Field, Label, MessageDecl, OptionDecl,
    SchemaFile, TypeDecl, TypeKind,
};
use crate::utils::{parse_error, quote};

lazy_static! {
    static ref IDENTIFIER:        Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref QUALIFIED:         Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").unwrap();
    static ref EQUALS:            Regex = Regex::new(r"^=$").unwrap();
    static ref SEMICOLON:         Regex = Regex::new(r"^;$").unwrap();
    static ref COMMA:             Regex = Regex::new(r"^,$").unwrap();
    static ref INTEGER:           Regex = Regex::new(r"^-?\d+$").unwrap();
    static ref NUMBER:            Regex = Regex::new(r"^-?\d+(\.\d+)?$").unwrap();
    static ref STRING_LIT:        Regex = Regex::new(r#"^"[^"]*"$"#).unwrap();
    static ref LEFT_BRACE:        Regex = Regex::new(r"^\{$").unwrap();
    static ref RIGHT_BRACE:       Regex = Regex::new(r"^\}$").unwrap();
    static ref LEFT_BRACKET:      Regex = Regex::new(r"^\[$").unwrap();
    static ref RIGHT_BRACKET:     Regex = Regex::new(r"^\]$").unwrap();
    static ref PACKAGE_KEYWORD:   Regex = Regex::new(r"^package$").unwrap();
    static ref IMPORT_KEYWORD:    Regex = Regex::new(r"^import$").unwrap();
    static ref OPTION_KEYWORD:    Regex = Regex::new(r"^option$").unwrap();
    static ref MESSAGE_KEYWORD:   Regex = Regex::new(r"^message$").unwrap();
    static ref ENUM_KEYWORD:      Regex = Regex::new(r"^enum$").unwrap();
    static ref EXTEND_KEYWORD:    Regex = Regex::new(r"^extend$").unwrap();
    static ref EXTENSIONS_KEYWORD: Regex = Regex::new(r"^extensions$").unwrap();
    static ref TO_KEYWORD:        Regex = Regex::new(r"^to$").unwrap();
    static ref MAX_KEYWORD:       Regex = Regex::new(r"^max$").unwrap();
    static ref LABEL_KEYWORD:     Regex = Regex::new(r"^(optional|required|repeated)$").unwrap();
    static ref EOF:               Regex = Regex::new(r"^$").unwrap();
}

/// Highest extension tag, stands in for `max` in extension ranges.
const MAX_TAG: i32 = 536_870_911;

/// Tokenizes and parses one schema file.
pub fn parse_schema(text: &str, file_name: &str) -> Result<SchemaFile, StitchError> {
    let tokens = tokenize_schema(text)?;
    Parser::new(&tokens, file_name).parse_file()
}

struct Parser<'a> {
    tokens:    &'a [Token],
    index:     usize,
    file_name: &'a str,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], file_name: &'a str) -> Parser<'a> {
        Parser { tokens, index: 0, file_name }
    }

    // The tokenizer always appends an EOF sentinel, so clamping to the last
    // token keeps diagnostics pointed at end-of-input instead of panicking.
    fn current(&self) -> &'a Token {
        let index = self.index.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn eat(&mut self, test: &Regex) -> bool {
        if test.is_match(&self.current().text) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, test: &Regex, expected: &str) -> Result<&'a Token, StitchError> {
        let tok = self.current();
        if self.eat(test) {
            Ok(tok)
        } else {
            Err(parse_error(
                &format!("Expected {} but found {}", expected, quote(&tok.text)),
                tok.line,
                tok.column,
            ))
        }
    }

    fn unexpected_token(&self) -> StitchError {
        let tok = self.current();
        parse_error(
            &format!("Unexpected token {}", quote(&tok.text)),
            tok.line,
            tok.column,
        )
    }

    fn parse_file(&mut self) -> Result<SchemaFile, StitchError> {
        let mut package_name = String::new();
        let mut java_package: Option<String> = None;
        let mut imports = Vec::new();
        let mut types = Vec::new();
        let mut extends = Vec::new();

        while !self.eat(&EOF) {
            if self.eat(&PACKAGE_KEYWORD) {
                let pkg_tok = self.expect(&QUALIFIED, "package name")?;
                package_name = pkg_tok.text.clone();
                self.expect(&SEMICOLON, "\";\"")?;
            } else if self.eat(&IMPORT_KEYWORD) {
                let path_tok = self.expect(&STRING_LIT, "import path string")?;
                imports.push(unquote(&path_tok.text));
                self.expect(&SEMICOLON, "\";\"")?;
            } else if self.eat(&OPTION_KEYWORD) {
                let option = self.parse_option()?;
                if option.name == "java_package" {
                    java_package = Some(option.value);
                }
                // Other file-level options carry no generation decision.
            } else if self.eat(&MESSAGE_KEYWORD) {
                let prefix = TypePath::from_dotted(&package_name);
                types.push(self.parse_message(&prefix)?);
            } else if self.eat(&ENUM_KEYWORD) {
                let prefix = TypePath::from_dotted(&package_name);
                types.push(self.parse_enum(&prefix)?);
            } else if self.eat(&EXTEND_KEYWORD) {
                extends.push(self.parse_extend()?);
            } else {
                return Err(self.unexpected_token());
            }
        }

        let java_package = java_package.unwrap_or_else(|| package_name.clone());
        Ok(SchemaFile {
            file_name: self.file_name.to_string(),
            package_name,
            java_package,
            imports,
            types,
            extends,
        })
    }

    fn parse_message(&mut self, prefix: &TypePath) -> Result<TypeDecl, StitchError> {
        let name_tok = self.expect(&IDENTIFIER, "message name")?;
        let full_name = prefix.child(&name_tok.text);
        self.expect(&LEFT_BRACE, "\"{\"")?;

        let mut fields = Vec::new();
        let mut extension_ranges = Vec::new();
        let mut options = Vec::new();
        let mut nested = Vec::new();

        while !self.eat(&RIGHT_BRACE) {
            if self.eat(&MESSAGE_KEYWORD) {
                nested.push(self.parse_message(&full_name)?);
            } else if self.eat(&ENUM_KEYWORD) {
                nested.push(self.parse_enum(&full_name)?);
            } else if self.eat(&OPTION_KEYWORD) {
                options.push(self.parse_option()?);
            } else if self.eat(&EXTENSIONS_KEYWORD) {
                extension_ranges.push(self.parse_extension_range()?);
            } else if LABEL_KEYWORD.is_match(&self.current().text) {
                fields.push(self.parse_field()?);
            } else {
                return Err(self.unexpected_token());
            }
        }

        Ok(TypeDecl {
            name:      name_tok.text.clone(),
            full_name,
            line:      name_tok.line,
            column:    name_tok.column,
            kind:      TypeKind::Message(MessageDecl {
                fields,
                extension_ranges,
                options,
            }),
            nested,
        })
    }

    fn parse_enum(&mut self, prefix: &TypePath) -> Result<TypeDecl, StitchError> {
        let name_tok = self.expect(&IDENTIFIER, "enum name")?;
        let full_name = prefix.child(&name_tok.text);
        self.expect(&LEFT_BRACE, "\"{\"")?;

        let mut values = Vec::new();
        while !self.eat(&RIGHT_BRACE) {
            let value_tok = self.expect(&IDENTIFIER, "enum value name")?;
            self.expect(&EQUALS, "\"=\"")?;
            let tag_tok = self.expect(&INTEGER, "integer")?;
            let tag = tag_tok.text.parse::<i32>().map_err(|_| {
                parse_error(
                    &format!("Invalid integer {}", quote(&tag_tok.text)),
                    tag_tok.line,
                    tag_tok.column,
                )
            })?;
            self.expect(&SEMICOLON, "\";\"")?;
            values.push(EnumValue { name: value_tok.text.clone(), tag });
        }

        if values.is_empty() {
            return Err(parse_error(
                &format!("Enum {} must declare at least one value", quote(&name_tok.text)),
                name_tok.line,
                name_tok.column,
            ));
        }

        Ok(TypeDecl {
            name:      name_tok.text.clone(),
            full_name,
            line:      name_tok.line,
            column:    name_tok.column,
            kind:      TypeKind::Enum(EnumDecl { values }),
            nested:    Vec::new(),
        })
    }

    fn parse_extend(&mut self) -> Result<ExtendDecl, StitchError> {
        let target_tok = self.expect(&QUALIFIED, "extended message name")?;
        self.expect(&LEFT_BRACE, "\"{\"")?;

        let mut fields = Vec::new();
        while !self.eat(&RIGHT_BRACE) {
            if !LABEL_KEYWORD.is_match(&self.current().text) {
                return Err(self.unexpected_token());
            }
            fields.push(self.parse_field()?);
        }

        Ok(ExtendDecl {
            target: target_tok.text.clone(),
            fields,
            line:   target_tok.line,
            column: target_tok.column,
        })
    }

    fn parse_field(&mut self) -> Result<Field, StitchError> {
        let label_tok = self.expect(&LABEL_KEYWORD, "field label")?;
        let label = match label_tok.text.as_str() {
            "optional" => Label::Optional,
            "required" => Label::Required,
            _ => Label::Repeated,
        };

        let type_tok = self.expect(&QUALIFIED, "field type")?;
        let name_tok = self.expect(&IDENTIFIER, "field name")?;
        self.expect(&EQUALS, "\"=\"")?;
        let tag_tok = self.expect(&INTEGER, "integer")?;
        let tag = tag_tok.text.parse::<u32>().map_err(|_| {
            parse_error(
                &format!("Invalid field tag {}", quote(&tag_tok.text)),
                tag_tok.line,
                tag_tok.column,
            )
        })?;

        let mut default_value = None;
        let mut packed = None;
        if self.eat(&LEFT_BRACKET) {
            loop {
                let option_tok = self.expect(&IDENTIFIER, "field option name")?;
                self.expect(&EQUALS, "\"=\"")?;
                let value_tok = self.current();
                if !self.eat(&STRING_LIT) && !self.eat(&NUMBER) && !self.eat(&QUALIFIED) {
                    return Err(parse_error(
                        &format!("Expected option value but found {}", quote(&value_tok.text)),
                        value_tok.line,
                        value_tok.column,
                    ));
                }
                match option_tok.text.as_str() {
                    "default" => default_value = Some(unquote(&value_tok.text)),
                    "packed" => packed = Some(value_tok.text == "true"),
                    // Unknown field options are accepted and dropped.
                    _ => {}
                }
                if !self.eat(&COMMA) {
                    break;
                }
            }
            self.expect(&RIGHT_BRACKET, "\"]\"")?;
        }

        self.expect(&SEMICOLON, "\";\"")?;

        Ok(Field {
            label,
            type_token: type_tok.text.clone(),
            name: name_tok.text.clone(),
            tag,
            default_value,
            packed,
            line: name_tok.line,
            column: name_tok.column,
        })
    }

    fn parse_extension_range(&mut self) -> Result<ExtensionRange, StitchError> {
        let low_tok = self.expect(&INTEGER, "integer")?;
        let low = low_tok.text.parse::<i32>().map_err(|_| {
            parse_error(
                &format!("Invalid integer {}", quote(&low_tok.text)),
                low_tok.line,
                low_tok.column,
            )
        })?;
        self.expect(&TO_KEYWORD, "\"to\"")?;
        let high = if self.eat(&MAX_KEYWORD) {
            MAX_TAG
        } else {
            let high_tok = self.expect(&INTEGER, "integer or \"max\"")?;
            high_tok.text.parse::<i32>().map_err(|_| {
                parse_error(
                    &format!("Invalid integer {}", quote(&high_tok.text)),
                    high_tok.line,
                    high_tok.column,
                )
            })?
        };
        self.expect(&SEMICOLON, "\";\"")?;
        Ok(ExtensionRange { low, high })
    }

    fn parse_option(&mut self) -> Result<OptionDecl, StitchError> {
        let name_tok = self.expect(&QUALIFIED, "option name")?;
        self.expect(&EQUALS, "\"=\"")?;
        let value_tok = self.current();
        if !self.eat(&STRING_LIT) && !self.eat(&NUMBER) && !self.eat(&QUALIFIED) {
            return Err(parse_error(
                &format!("Expected option value but found {}", quote(&value_tok.text)),
                value_tok.line,
                value_tok.column,
            ));
        }
        self.expect(&SEMICOLON, "\";\"")?;
        Ok(OptionDecl {
            name:  name_tok.text.clone(),
            value: unquote(&value_tok.text),
        })
    }
}

fn unquote(text: &str) -> String {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}
