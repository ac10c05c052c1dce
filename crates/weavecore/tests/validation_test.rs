mod common;

use common::{passthrough, workflow_of, FnActivity};
use weavecore::{Connection, ParamDirection, Parameter, Workflow, WorkflowError};

fn link(source: &str, target: &str) -> Connection {
    Connection::new(source, "output1", target, "input1")
}

#[test]
fn test_valid_chain() {
    let mut workflow = workflow_of(&["node1", "node2", "node3"]);
    workflow.connect("node1", "output1", "node2", "input1").unwrap();
    workflow.connect("node2", "output1", "node3", "input1").unwrap();

    let topology = workflow.validate().unwrap();
    assert_eq!(topology.roots.iter().collect::<Vec<_>>(), vec!["node1"]);
    assert_eq!(topology.leaves.iter().collect::<Vec<_>>(), vec!["node3"]);
}

#[test]
fn test_validation_is_idempotent() {
    let mut workflow = workflow_of(&["a", "b"]);
    workflow.connect("a", "output1", "b", "input1").unwrap();
    assert_eq!(workflow.validate().unwrap(), workflow.validate().unwrap());
}

#[test]
fn test_single_node_is_root_and_leaf() {
    let workflow = workflow_of(&["only"]);
    let topology = workflow.validate().unwrap();
    assert!(topology.is_root("only"));
    assert!(topology.is_leaf("only"));
}

#[test]
fn test_duplicate_labels() {
    let mut workflow = Workflow::new();
    workflow.add_node("a", passthrough(), "Same").unwrap();
    workflow.add_node("b", passthrough(), "Same").unwrap();
    workflow.connections.push(link("a", "b"));
    assert_eq!(
        workflow.validate(),
        Err(WorkflowError::DuplicateNodeLabel("Same".to_string()))
    );
}

#[test]
fn test_duplicate_node_id() {
    let mut workflow = workflow_of(&["a"]);
    assert_eq!(
        workflow.add_node("a", passthrough(), "Another"),
        Err(WorkflowError::DuplicateNodeId("a".to_string()))
    );
}

#[test]
fn test_multiple_nodes_without_connections() {
    let workflow = workflow_of(&["a", "b"]);
    assert_eq!(
        workflow.validate(),
        Err(WorkflowError::NoConnectionsAmongMultipleNodes)
    );
}

#[test]
fn test_multiple_connections_to_one_input() {
    let mut workflow = workflow_of(&["a", "b", "c"]);
    workflow.connect("a", "output1", "c", "input1").unwrap();
    workflow.connect("b", "output1", "c", "input1").unwrap();
    assert_eq!(
        workflow.validate(),
        Err(WorkflowError::MultipleConnectionsToInput {
            node: "c".to_string(),
            param: "input1".to_string(),
        })
    );
}

#[test]
fn test_cycle_is_rejected() {
    let mut workflow = workflow_of(&["node1", "node2"]);
    workflow.connect("node2", "output1", "node1", "input1").unwrap();
    workflow.connect("node1", "output1", "node2", "input1").unwrap();
    assert_eq!(workflow.validate(), Err(WorkflowError::CyclicDependency));
    assert_eq!(workflow.topological_order(), Err(WorkflowError::CyclicDependency));
}

#[test]
fn test_self_loop_is_a_cycle() {
    let mut workflow = workflow_of(&["a", "b"]);
    workflow.connections.push(link("a", "a"));
    workflow.connections.push(Connection::new("a", "output1", "b", "input1"));
    assert_eq!(workflow.validate(), Err(WorkflowError::CyclicDependency));
}

#[test]
fn test_missing_target_node() {
    let mut workflow = workflow_of(&["node1"]);
    assert_eq!(
        workflow.connect("node1", "output1", "nonexistent", "input1"),
        Err(WorkflowError::NodeNotFound("nonexistent".to_string()))
    );

    workflow.connections.push(link("node1", "nonexistent"));
    assert_eq!(
        workflow.validate(),
        Err(WorkflowError::NodeNotFound("nonexistent".to_string()))
    );
}

#[test]
fn test_missing_parameter() {
    let mut workflow = workflow_of(&["node1", "node2"]);
    assert_eq!(
        workflow.connect("node1", "nonexistent", "node2", "input1"),
        Err(WorkflowError::ParameterNotFound {
            node: "node1".to_string(),
            param: "nonexistent".to_string(),
            direction: ParamDirection::Output,
        })
    );
    assert!(matches!(
        workflow.connect("node1", "output1", "node2", "nope"),
        Err(WorkflowError::ParameterNotFound { direction: ParamDirection::Input, .. })
    ));
}

#[test]
fn test_type_mismatch() {
    let mut workflow = Workflow::new();
    workflow.add_node("node1", passthrough(), "Node 1").unwrap();
    workflow
        .add_node(
            "node2",
            FnActivity::schema(vec![Parameter::integer("input1")], vec![]),
            "Node 2",
        )
        .unwrap();

    let err = workflow
        .connect("node1", "output1", "node2", "input1")
        .unwrap_err();
    assert!(matches!(
        &err,
        WorkflowError::TypeMismatch { source_kind, target_kind, .. }
            if source_kind == "string" && target_kind == "integer"
    ));
    assert!(err.to_string().contains("Type mismatch"));

    workflow.connections.push(link("node1", "node2"));
    assert!(matches!(workflow.validate(), Err(WorkflowError::TypeMismatch { .. })));
}

#[test]
fn test_nested_shapes_are_not_compared() {
    let mut workflow = Workflow::new();
    workflow
        .add_node(
            "a",
            FnActivity::schema(vec![], vec![Parameter::array("out", Parameter::string("s"))]),
            "A",
        )
        .unwrap();
    workflow
        .add_node(
            "b",
            FnActivity::schema(vec![Parameter::array("in", Parameter::integer("i"))], vec![]),
            "B",
        )
        .unwrap();
    workflow.connect("a", "out", "b", "in").unwrap();
    assert!(workflow.validate().is_ok());
}

#[test]
fn test_unconnected_input_of_non_root() {
    let mut workflow = Workflow::new();
    workflow.add_node("node1", passthrough(), "Node 1").unwrap();
    workflow
        .add_node(
            "node2",
            FnActivity::schema(
                vec![Parameter::string("input1"), Parameter::string("input2")],
                vec![Parameter::string("output1")],
            ),
            "Node 2",
        )
        .unwrap();
    workflow.connect("node1", "output1", "node2", "input1").unwrap();

    let err = workflow.validate().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Input parameter input2 of non-root node node2 is not connected"
    );
}

#[test]
fn test_unconnected_output_of_non_leaf() {
    let mut workflow = Workflow::new();
    workflow.add_node("node1", passthrough(), "Node 1").unwrap();
    workflow
        .add_node(
            "node2",
            FnActivity::schema(
                vec![Parameter::string("input1")],
                vec![Parameter::string("output1"), Parameter::string("output2")],
            ),
            "Node 2",
        )
        .unwrap();
    workflow.add_node("node3", passthrough(), "Node 3").unwrap();
    workflow.connect("node1", "output1", "node2", "input1").unwrap();
    workflow.connect("node2", "output1", "node3", "input1").unwrap();

    assert_eq!(
        workflow.validate(),
        Err(WorkflowError::UnconnectedOutput {
            node: "node2".to_string(),
            param: "output2".to_string(),
        })
    );
}

#[test]
fn test_disconnected_node() {
    let mut workflow = workflow_of(&["a", "b", "loner"]);
    workflow.connect("a", "output1", "b", "input1").unwrap();
    assert_eq!(
        workflow.validate(),
        Err(WorkflowError::DisconnectedNodes(vec!["loner".to_string()]))
    );
}

#[test]
fn test_topological_order_ties_follow_insertion() {
    let mut workflow = Workflow::new();
    for id in ["c", "a", "b"] {
        workflow.add_node(id, passthrough(), id).unwrap();
    }
    workflow
        .add_node(
            "join",
            FnActivity::schema(
                vec![
                    Parameter::string("x"),
                    Parameter::string("y"),
                    Parameter::string("z"),
                ],
                vec![],
            ),
            "join",
        )
        .unwrap();
    workflow.connect("a", "output1", "join", "y").unwrap();
    workflow.connect("b", "output1", "join", "z").unwrap();
    workflow.connect("c", "output1", "join", "x").unwrap();

    assert_eq!(
        workflow.topological_order().unwrap(),
        vec!["c", "a", "b", "join"]
    );
}
