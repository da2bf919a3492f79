//! SDL rendering of a [`Registry`].

use std::fmt::Write;

use crate::registry::{FieldDef, InputValueDef, MetaType, Registry};

/// Render every non built-in type followed by the `schema` block.
#[must_use]
pub fn print_schema(registry: &Registry) -> String {
    let blocks: Vec<String> = registry
        .types()
        .filter_map(print_type)
        .chain(std::iter::once(print_roots(registry)))
        .collect();
    let mut sdl = blocks.join("\n\n");
    sdl.push('\n');
    sdl
}

fn print_type(ty: &MetaType) -> Option<String> {
    let mut out = String::new();
    match ty {
        MetaType::Scalar(kind) if kind.is_builtin() => return None,
        MetaType::Scalar(kind) => {
            let _ = write!(out, "scalar {}", kind.name());
        },
        MetaType::Enum(ty) => {
            description(&mut out, ty.description, "");
            let _ = writeln!(out, "enum {} {{", ty.name);
            for value in &ty.values {
                let _ = writeln!(out, "  {value}");
            }
            out.push('}');
        },
        MetaType::InputObject(ty) => {
            description(&mut out, ty.description, "");
            let _ = writeln!(out, "input {} {{", ty.name);
            for field in ty.fields.values() {
                description(&mut out, field.description, "  ");
                let _ = writeln!(out, "  {}: {}", field.name, field.ty);
            }
            out.push('}');
        },
        MetaType::Object(ty) => {
            description(&mut out, ty.description, "");
            let _ = writeln!(out, "type {} {{", ty.name);
            for field in ty.fields.values() {
                print_field(&mut out, field);
            }
            out.push('}');
        },
    }
    Some(out)
}

fn print_field(out: &mut String, field: &FieldDef) {
    description(out, field.description, "  ");
    let _ = write!(out, "  {}", field.name);
    if !field.args.is_empty() {
        let args: Vec<String> = field.args.values().map(print_arg).collect();
        let _ = write!(out, "({})", args.join(", "));
    }
    let _ = writeln!(out, ": {}", field.ty);
}

fn print_arg(arg: &InputValueDef) -> String {
    format!("{}: {}", arg.name, arg.ty)
}

fn print_roots(registry: &Registry) -> String {
    let mut out = String::from("schema {\n");
    let _ = writeln!(out, "  query: {}", registry.query_type());
    if let Some(mutation) = registry.mutation_type() {
        let _ = writeln!(out, "  mutation: {mutation}");
    }
    out.push('}');
    out
}

fn description(out: &mut String, description: Option<&str>, indent: &str) {
    if let Some(text) = description {
        let _ = writeln!(out, "{indent}\"\"\"{}\"\"\"", text.replace("\"\"\"", "\\\"\"\""));
    }
}
