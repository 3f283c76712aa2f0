use std::io::Write;

use sbml_astconv::renderer::InfixRenderer;
use sbml_astconv::{
  parse_formula, AstConverter, AstNode, ConvertError, FunctionDefinition,
  Model, ModelLookup, NodeType,
};

const MODEL_JSON: &str = r#"{
  "id": "glycolysis",
  "functions": {
    "mm": "lambda(S, Vmax, Km, Vmax * S / (Km + S))",
    "two": "2"
  }
}"#;

#[test]
fn definition_from_lambda_reads_the_formals() {
  let math = parse_formula("lambda(a, b, a + b)").unwrap();
  let definition = FunctionDefinition::from_lambda("add", math.clone());

  assert_eq!(definition.id(), "add");
  assert_eq!(definition.num_arguments(), 2);
  assert_eq!(definition.argument(0), Some("a"));
  assert_eq!(definition.argument(1), Some("b"));
  assert_eq!(definition.argument(2), None);
  assert_eq!(definition.body(), &math);
}

#[test]
fn non_lambda_math_becomes_a_nullary_function() {
  let definition =
    FunctionDefinition::from_lambda("c", parse_formula("3 * k").unwrap());

  assert_eq!(definition.num_arguments(), 0);
  assert_eq!(definition.body().node_type(), NodeType::Lambda);
  assert_eq!(
    definition.body().right_child().map(AstNode::node_type),
    Some(NodeType::Times)
  );
}

#[test]
fn model_from_json() {
  let model = Model::from_json(MODEL_JSON).unwrap();

  assert_eq!(model.id, "glycolysis");
  assert_eq!(model.functions().count(), 2);
  let mm = model.function_definition("mm").unwrap();
  assert_eq!(mm.arguments(), ["S", "Vmax", "Km"]);
  assert!(model.function_definition("missing").is_none());
}

#[test]
fn model_functions_render_inline() {
  let model = Model::from_json(MODEL_JSON).unwrap();
  let converter = AstConverter::new(InfixRenderer::c()).with_model(&model);

  let tree = parse_formula("mm(glc, 10, 0.1) * two()").unwrap();
  assert_eq!(
    converter.convert(&tree).as_deref(),
    Some("(((10*glc)/(0.1+glc))*2)")
  );
}

#[test]
fn add_function_replaces_by_id() {
  let mut model = Model::new("m");
  model.add_function(FunctionDefinition::from_lambda(
    "f",
    parse_formula("lambda(x, x)").unwrap(),
  ));
  model.add_function(FunctionDefinition::from_lambda(
    "f",
    parse_formula("lambda(x, -x)").unwrap(),
  ));

  let converter = AstConverter::new(InfixRenderer::c()).with_model(&model);
  assert_eq!(
    converter.convert(&parse_formula("f(y)").unwrap()).as_deref(),
    Some("(-y)")
  );
}

#[test]
fn invalid_json_is_rejected() {
  assert!(matches!(
    Model::from_json("{ not json"),
    Err(ConvertError::Json(_))
  ));
}

#[test]
fn invalid_formula_names_the_function() {
  let err = Model::from_json(r#"{"functions": {"bad": "1 +"}}"#).unwrap_err();
  match err {
    ConvertError::Model(message) => assert!(message.contains("bad")),
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn load_from_file() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  file.write_all(MODEL_JSON.as_bytes()).unwrap();

  let model = Model::load(file.path()).unwrap();
  assert!(model.function_definition("mm").is_some());
}

#[test]
fn load_missing_file_is_io_error() {
  let dir = tempfile::tempdir().unwrap();
  let missing = dir.path().join("missing.json");

  assert!(matches!(Model::load(missing), Err(ConvertError::Io(_))));
}
