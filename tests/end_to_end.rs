use appsync_gen::error::{GenerateError, ManifestError, RenderError};
use appsync_gen::{run, GeneratorConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MANIFEST: &str = r#"---
version: v2.0.0
apiNameSuffix: zoo
enums:
  Diet:
    - HERBIVORE
    - CARNIVORE
objects:
  Animal:
    - name: id
      type: ID!
    - name: name
      type: String!
    - name: legs
      type: Int
    - name: diet
      type: Diet
    - name: born
      type: AWSDate
  Person:
    - name: id
      type: ID!
    - name: name
    - name: pets
      resolver:
        source: AnimalTable
        action: list
        type: [Animal]
        sortDescending: true
        keyFields:
          - ownerId:ID!
queries:
  - name: animals
    type: [Animal]
    resolver:
      source: AnimalTable
      action: list
  - name: animal
    type: Animal
    resolver:
      source: AnimalTable
      action: get
      keyFields:
        - id:ID!
  - name: person
    type: Person
    resolver:
      action: get
      keyFields:
        - id:ID!
  - name: searchAnimals
    type: [Animal]
    resolver:
      source: AnimalTable
      action: custom
      template: search
mutations:
  - name: addAnimal
    type: Animal
    resolver:
      source: AnimalTable
      action: insert
  - name: removeAnimal
    type: Animal
    resolver:
      source: AnimalTable
      action: delete
      keyFields:
        - id:ID!
sources:
  AnimalTable:
    dynamo:
      hash_key: id
      sort_key: born:S
  default:
    lambda:
      function_name: zoo-default
"#;

fn standard_templates() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// Manifest plus a `mapping-templates` dir beside it with the custom
/// `search` template.
fn workspace(manifest: &str) -> (TempDir, GeneratorConfig) {
    let dir = TempDir::new().unwrap();
    let manifest_path = dir.path().join("zoo.yml");
    write(&manifest_path, manifest);
    let custom = dir.path().join("mapping-templates");
    write(&custom.join("dynamo/request/search.tmpl"), "{\"operation\": \"Scan\", \"field\": \"{{ fieldName }}\"}");
    write(&custom.join("dynamo/response/search.tmpl"), "$util.toJson($ctx.result.items)");

    let mut config = GeneratorConfig::new(&manifest_path);
    config.template_root = standard_templates();
    config.output_path = dir.path().join("generated");
    (dir, config)
}

fn read(config: &GeneratorConfig, name: &str) -> String {
    fs::read_to_string(config.output_path.join(name)).unwrap()
}

#[tokio::test]
async fn generates_schema_resolvers_and_data_sources() {
    let (_dir, config) = workspace(MANIFEST);
    assert!(config.custom_template_root.is_some());

    let report = run(config.clone()).await.unwrap();
    for e in &report.errors {
        eprintln!("{}: {}", e.name, e.error);
    }
    assert!(report.is_success(), "{:?}", report.schema_errors);

    let mut names: Vec<String> = fs::read_dir(&config.output_path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "_datasource_animaltable.tf",
            "_datasource_default.tf",
            "_mutation_addanimal.tf",
            "_mutation_removeanimal.tf",
            "_person_pets.tf",
            "_query_animal.tf",
            "_query_animals.tf",
            "_query_person.tf",
            "_query_searchanimals.tf",
            "schema.public.graphql",
        ]
    );
    assert_eq!(report.written.len(), names.len());
}

#[tokio::test]
async fn schema_document_has_derived_types() {
    let (_dir, config) = workspace(MANIFEST);
    run(config.clone()).await.unwrap();
    let sdl = read(&config, "schema.public.graphql");

    assert!(sdl.contains(
        "input AnimalFilter {\n    id: TableIDFilterInput\n    name: TableStringFilterInput\n    legs: TableIntFilterInput\n    born: TableStringFilterInput\n}"
    ));
    assert!(sdl.contains("type AnimalConnection {\n    items: [Animal]\n    nextToken: String\n}"));
    assert!(sdl.contains("animals(filter: AnimalFilter, limit: Int, nextToken: String): AnimalConnection!"));
    assert!(sdl.contains("    animal(id: ID!): Animal\n"));
    assert!(sdl.contains("    searchAnimals: [Animal]\n"));
    assert!(sdl.contains("    pets: [Animal]\n"));
    assert!(sdl.contains("addAnimal(input: CreateAnimalInput): Animal"));
    assert!(sdl.contains("input CreateAnimalInput {\n    name: String\n    legs: Int\n    diet: Diet\n    born: AWSDate\n}"));
    assert!(!sdl.contains("UpdateAnimalInput"));
    assert!(!sdl.contains("PersonConnection"));
}

#[tokio::test]
async fn resolver_files_use_the_right_templates() {
    let (_dir, config) = workspace(MANIFEST);
    run(config.clone()).await.unwrap();

    let animal = read(&config, "_query_animal.tf");
    assert!(animal.contains("resource \"aws_appsync_resolver\" \"query_animal\""));
    assert!(animal.contains("\"operation\": \"GetItem\""));
    assert!(animal.contains("$ctx.args.id"));
    assert!(animal.contains("\"born\": $util.dynamodb.toDynamoDBJson($ctx.args.born)"));
    assert!(animal.contains("aws_appsync_datasource.animaltable.name"));

    let pets = read(&config, "_person_pets.tf");
    assert!(pets.contains("\"operation\": \"Query\""));
    assert!(pets.contains("\"#parent\": \"ownerId\""));
    assert!(pets.contains("\"scanIndexForward\": false"));

    let person = read(&config, "_query_person.tf");
    assert!(person.contains("\"operation\": \"Invoke\""));
    assert!(person.contains("aws_appsync_datasource.default.name"));

    let search = read(&config, "_query_searchanimals.tf");
    assert!(search.contains("{\"operation\": \"Scan\", \"field\": \"searchAnimals\"}"));

    let table = read(&config, "_datasource_animaltable.tf");
    assert!(table.contains("hash_key     = \"id\""));
    assert!(table.contains("range_key    = \"born\""));
    assert!(table.contains("enabled = true"));
    let lambda = read(&config, "_datasource_default.tf");
    assert!(lambda.contains("aws_lambda_function.zoo-default.arn"));
}

#[tokio::test]
async fn nested_lambda_resolvers_render_with_standard_templates() {
    let manifest = MANIFEST.replace(
        "      resolver:\n        source: AnimalTable\n        action: list\n",
        "      resolver:\n        action: list\n",
    );
    assert_ne!(manifest, MANIFEST);
    let (_dir, config) = workspace(&manifest);
    let report = run(config.clone()).await.unwrap();
    assert!(report.is_success(), "{:?}", report.errors.iter().map(|e| e.error.to_string()).collect::<Vec<_>>());

    let pets = read(&config, "_person_pets.tf");
    assert!(pets.contains("\"operation\": \"Invoke\""));
    assert!(pets.contains("\"parentKey\": \"ownerId\""));
    assert!(pets.contains("aws_appsync_datasource.default.name"));
}

#[tokio::test]
async fn partial_failures_still_emit_other_artifacts() {
    // SQL has no standard resolver templates, and the source name is unknown
    // for one query.
    let manifest = MANIFEST
        .replace(
            "  default:\n    lambda:\n      function_name: zoo-default\n",
            "  default:\n    lambda:\n      function_name: zoo-default\n  Reports:\n    sql:\n      primary_key: id\n",
        )
        .replace(
            "  - name: person\n    type: Person\n    resolver:\n      action: get",
            "  - name: person\n    type: Person\n    resolver:\n      source: Reports\n      action: get",
        )
        .replace(
            "  - name: animal\n    type: Animal\n    resolver:\n      source: AnimalTable",
            "  - name: animal\n    type: Animal\n    resolver:\n      source: Nowhere",
        );
    let (_dir, config) = workspace(&manifest);
    let report = run(config.clone()).await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(report.errors[0].error, RenderError::TemplateMissing { .. }));
    assert!(report.schema_errors.is_empty());
    // `Nowhere` falls back to the default lambda source.
    assert!(read(&config, "_query_animal.tf").contains("\"operation\": \"Invoke\""));
    assert!(read(&config, "_datasource_reports.tf").contains("RELATIONAL_DATABASE"));
    assert!(!config.output_path.join("_query_person.tf").exists());
}

#[tokio::test]
async fn unsupported_version_is_fatal() {
    let (_dir, config) = workspace(&MANIFEST.replace("version: v2.0.0", "version: v3.1.0"));
    let err = run(config.clone()).await.unwrap_err();
    match err {
        GenerateError::Manifest(ManifestError::UnsupportedVersion { found }) => assert_eq!(found, "v3.1.0"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!config.output_path.exists());
}

#[tokio::test]
async fn missing_manifest_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = GeneratorConfig::new(dir.path().join("absent.yml"));
    let err = run(config).await.unwrap_err();
    assert!(matches!(err, GenerateError::Manifest(ManifestError::Read { .. })));
}
