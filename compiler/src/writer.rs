//! Line-oriented Java source writer. Knows indentation and the handful of
//! constructs the generator emits; all naming decisions happen elsewhere.

use std::io::{self, Write};

const INDENT: &str = "  ";
const LINE_WRAP_INDENT: &str = "    ";

pub struct JavaWriter<W: Write> {
    out:    W,
    indent: usize,
}

impl<W: Write> JavaWriter<W> {
    pub fn new(out: W) -> JavaWriter<W> {
        JavaWriter { out, indent: 0 }
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return writeln!(self.out);
        }
        for _ in 0..self.indent {
            write!(self.out, "{}", INDENT)?;
        }
        writeln!(self.out, "{}", text)
    }

    pub fn emit_single_line_comment(&mut self, text: &str) -> io::Result<()> {
        self.line(&format!("// {}", text))
    }

    pub fn emit_package(&mut self, java_package: &str) -> io::Result<()> {
        if java_package.is_empty() {
            return Ok(());
        }
        self.line(&format!("package {};", java_package))?;
        self.emit_empty_line()
    }

    pub fn emit_imports<'a, T>(&mut self, imports: T) -> io::Result<()>
    where
        T: IntoIterator<Item = &'a String>,
    {
        let mut any = false;
        for import in imports {
            self.line(&format!("import {};", import))?;
            any = true;
        }
        if any {
            self.emit_empty_line()?;
        }
        Ok(())
    }

    pub fn emit_static_imports<'a, T>(&mut self, imports: T) -> io::Result<()>
    where
        T: IntoIterator<Item = &'a String>,
    {
        let mut any = false;
        for import in imports {
            self.line(&format!("import static {};", import))?;
            any = true;
        }
        if any {
            self.emit_empty_line()?;
        }
        Ok(())
    }

    pub fn emit_empty_line(&mut self) -> io::Result<()> {
        self.line("")
    }

    pub fn emit_annotation(&mut self, text: &str) -> io::Result<()> {
        self.line(&format!("@{}", text))
    }

    /// Opens a type body: `<modifiers> <kind> <name>[ extends <supertype>] {`.
    pub fn begin_type(
        &mut self,
        modifiers: &str,
        kind: &str,
        name: &str,
        supertype: Option<&str>,
    ) -> io::Result<()> {
        let mut decl = format!("{} {} {}", modifiers, kind, name);
        if let Some(supertype) = supertype {
            decl.push_str(&format!(" extends {}", supertype));
        }
        decl.push_str(" {");
        self.line(&decl)?;
        self.indent += 1;
        Ok(())
    }

    pub fn end_type(&mut self) -> io::Result<()> {
        self.indent -= 1;
        self.line("}")
    }

    /// A field or constant declaration. Multi-line initializers keep their
    /// own relative layout and are wrapped at the continuation indent.
    pub fn emit_field(
        &mut self,
        java_type: &str,
        name: &str,
        modifiers: &str,
        initializer: Option<&str>,
    ) -> io::Result<()> {
        let prefix = if modifiers.is_empty() {
            format!("{} {}", java_type, name)
        } else {
            format!("{} {} {}", modifiers, java_type, name)
        };
        match initializer {
            None => self.line(&format!("{};", prefix)),
            Some(init) if !init.contains('\n') => {
                self.line(&format!("{} = {};", prefix, init))
            }
            Some(init) => {
                let lines: Vec<&str> = init.lines().collect();
                self.line(&format!("{} = {}", prefix, lines[0]))?;
                for (index, continuation) in lines[1..].iter().enumerate() {
                    let terminator = if index == lines.len() - 2 { ";" } else { "" };
                    let mut wrapped = String::new();
                    for _ in 0..self.indent {
                        wrapped.push_str(INDENT);
                    }
                    wrapped.push_str(LINE_WRAP_INDENT);
                    wrapped.push_str(continuation);
                    wrapped.push_str(terminator);
                    writeln!(self.out, "{}", wrapped)?;
                }
                Ok(())
            }
        }
    }

    /// One enum constant; all but the last are comma-terminated.
    pub fn emit_enum_constant(&mut self, name: &str, last: bool) -> io::Result<()> {
        if last {
            self.line(name)
        } else {
            self.line(&format!("{},", name))
        }
    }

    /// `private Foo() {}`, keeps holder and registry classes uninstantiable.
    pub fn emit_private_constructor(&mut self, class_name: &str) -> io::Result<()> {
        self.line(&format!("private {}() {{", class_name))?;
        self.line("}")
    }

    /// Finalizes the artifact. Called on the success path; the underlying
    /// stream is still dropped (and closed) if generation unwinds early.
    pub fn finish(mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(build: impl FnOnce(&mut JavaWriter<&mut Vec<u8>>) -> io::Result<()>) -> String {
        let mut buffer = Vec::new();
        let mut writer = JavaWriter::new(&mut buffer);
        build(&mut writer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_type_scope_indentation() {
        let text = render(|w| {
            w.emit_package("p")?;
            w.begin_type("public final", "class", "Foo", Some("Message"))?;
            w.emit_field("Integer", "id", "public", None)?;
            w.end_type()
        });
        assert_eq!(
            text,
            "package p;\n\npublic final class Foo extends Message {\n  public Integer id;\n}\n"
        );
    }

    #[test]
    fn test_multi_line_initializer_gets_terminated() {
        let text = render(|w| {
            w.emit_field(
                "Extension<Base, String>",
                "note",
                "public static final",
                Some("Extension\n.stringExtending(Base.class)\n.buildOptional()"),
            )
        });
        assert_eq!(
            text,
            "public static final Extension<Base, String> note = Extension\n    .stringExtending(Base.class)\n    .buildOptional();\n"
        );
    }
}
