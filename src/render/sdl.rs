//! GraphQL SDL document for a resolved schema.

use crate::manifest::{Field, Operation};
use crate::schema::{Object, ResolvedSchema, FILTERABLE_SCALARS};

/// File name of the rendered SDL document.
pub const SCHEMA_FILE_NAME: &str = "schema.public.graphql";

const FILTER_OPERATORS: [&str; 8] = ["ne", "eq", "le", "lt", "ge", "gt", "contains", "notContains"];

pub fn render_sdl(schema: &ResolvedSchema) -> String {
    let mut out = String::new();

    for (name, values) in &schema.enums {
        block(&mut out, "enum", name, values.iter().cloned());
    }
    for object in schema.objects.values() {
        block(&mut out, "type", &object.name, object.fields.iter().map(field_line));
    }
    for base in &schema.connections {
        block(
            &mut out,
            "type",
            &format!("{}Connection", base),
            [format!("items: [{}]", base), "nextToken: String".to_string()],
        );
    }
    for object in schema.filter_objects.values().chain(schema.input_objects.values()) {
        input_block(&mut out, object);
    }
    if !schema.queries.is_empty() {
        block(&mut out, "type", "Query", schema.queries.iter().map(Operation::signature));
    }
    if !schema.mutations.is_empty() {
        block(&mut out, "type", "Mutation", schema.mutations.iter().map(Operation::signature));
    }

    out.push_str(&scalar_filter_inputs());

    let mut roots = Vec::new();
    if !schema.queries.is_empty() {
        roots.push("query: Query".to_string());
    }
    if !schema.mutations.is_empty() {
        roots.push("mutation: Mutation".to_string());
    }
    if !roots.is_empty() {
        out.push_str("schema {\n");
        for line in roots {
            out.push_str(&format!("    {}\n", line));
        }
        out.push_str("}\n");
    }
    out
}

fn block(out: &mut String, keyword: &str, name: &str, lines: impl IntoIterator<Item = String>) {
    out.push_str(&format!("{} {} {{\n", keyword, name));
    for line in lines {
        out.push_str(&format!("    {}\n", line));
    }
    out.push_str("}\n\n");
}

fn input_block(out: &mut String, object: &Object) {
    block(out, "input", &object.name, object.fields.iter().map(field_line));
}

/// Plain fields render their type; resolver fields their signature.
fn field_line(field: &Field) -> String {
    if let Some(signature) = field.resolver.as_ref().and_then(|r| r.signature()) {
        return signature;
    }
    let ty = field
        .field_type
        .clone()
        .or_else(|| field.resolver.as_ref().and_then(|r| r.return_type.clone()))
        .unwrap_or_default();
    format!("{}: {}", field.name, ty)
}

/// The fixed `Table<Scalar>FilterInput` types referenced by filter objects.
fn scalar_filter_inputs() -> String {
    let mut out = String::new();
    block(
        &mut out,
        "input",
        "TableBooleanFilterInput",
        ["ne: Boolean".to_string(), "eq: Boolean".to_string()],
    );
    for scalar in FILTERABLE_SCALARS {
        let lines = FILTER_OPERATORS
            .iter()
            .map(|op| format!("{}: {}", op, scalar))
            .chain(std::iter::once(format!("between: [{}]", scalar)));
        block(&mut out, "input", &format!("Table{}FilterInput", scalar), lines);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse;
    use crate::schema::resolve;

    const MANIFEST: &str = r#"
version: v2.0.0
apiNameSuffix: zoo
enums:
  Diet: [HERBIVORE, CARNIVORE]
objects:
  Animal:
    - name: id
      type: ID!
    - name: name
    - name: legs
      type: Int
    - name: tags
      type: [String]
    - name: friends
      resolver:
        action: list
        type: [Animal]
queries:
  - name: animals
    type: [Animal]
    resolver:
      action: list
mutations:
  - name: addAnimal
    type: Animal
    resolver:
      action: insert
sources:
  default:
    dynamo:
      hash_key: id
"#;

    fn sdl() -> String {
        render_sdl(&resolve(parse(MANIFEST.as_bytes()).unwrap()))
    }

    #[test]
    fn renders_types_in_declaration_order() {
        let sdl = sdl();
        let enum_at = sdl.find("enum Diet {").unwrap();
        let animal_at = sdl.find("type Animal {").unwrap();
        let connection_at = sdl.find("type AnimalConnection {").unwrap();
        let query_at = sdl.find("type Query {").unwrap();
        assert!(enum_at < animal_at && animal_at < connection_at && connection_at < query_at);
        assert!(sdl.contains("    HERBIVORE\n    CARNIVORE\n"));
        assert!(sdl.contains("    id: ID!\n    name: String\n    legs: Int\n    tags: [String]\n"));
        assert!(sdl.contains("    friends: [Animal]\n"));
        assert!(sdl.contains("    items: [Animal]\n    nextToken: String\n"));
    }

    #[test]
    fn renders_operations_and_inputs() {
        let sdl = sdl();
        assert!(sdl.contains(
            "    animals(filter: AnimalFilter, limit: Int, nextToken: String): AnimalConnection!\n"
        ));
        assert!(sdl.contains("    addAnimal(input: CreateAnimalInput): Animal\n"));
        assert!(sdl.contains("input AnimalFilter {\n    id: TableIDFilterInput\n    name: TableStringFilterInput\n    legs: TableIntFilterInput\n    tags: TableStringFilterInput\n}"));
        assert!(sdl.contains("input CreateAnimalInput {\n    name: String\n    legs: Int\n    tags: [String]\n}"));
        assert!(sdl.ends_with("schema {\n    query: Query\n    mutation: Mutation\n}\n"));
    }

    #[test]
    fn includes_scalar_filter_inputs() {
        let sdl = sdl();
        assert!(sdl.contains("input TableBooleanFilterInput {\n    ne: Boolean\n    eq: Boolean\n}"));
        assert!(sdl.contains("    notContains: Float\n    between: [Float]\n"));
        assert!(sdl.contains("input TableIDFilterInput {"));
    }
}
