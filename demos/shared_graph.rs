//! Shared records and cycles.
//!
//! Run with: cargo run --example shared_graph

use rmxml::{generate, parse, FieldMap, TreeNode, Value};
use std::error::Error;

fn print_tree(node: &TreeNode, depth: usize) {
    let attributes: Vec<_> = node
        .attributes
        .iter()
        .map(|(k, v)| format!(" {}=\"{}\"", k, v))
        .collect();
    let text = node.text().map(|t| format!(" {}", t)).unwrap_or_default();
    println!(
        "{}<{}{}>{}",
        "  ".repeat(depth),
        node.tag,
        attributes.concat(),
        text
    );
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let map = Value::object("Map", FieldMap::new());
    map.set_field("name", Value::from("Aluxes Village"));

    let inn = Value::object("Event", FieldMap::new());
    inn.set_field("name", Value::from("Innkeeper"));
    inn.set_field("map", map.clone());

    let guard = Value::object("Event", FieldMap::new());
    guard.set_field("name", Value::from("Guard"));
    guard.set_field("map", map.clone());
    guard.set_field("watching", inn.clone());

    map.set_field("events", Value::Array(vec![inn, guard]));

    let tree = generate(&map)?;
    print_tree(&tree, 0);

    let back = parse(&tree)?;
    let events = back.field("events").unwrap_or_default();
    let events = events.as_array().map(Vec::as_slice).unwrap_or_default();

    println!();
    for event in events {
        let owner = event.field("map").unwrap_or_default();
        println!(
            "{} points back at its map: {}",
            event.field("name").unwrap_or_default(),
            owner.same_object(&back)
        );
    }
    if let [inn, guard] = events {
        let watching = guard.field("watching").unwrap_or_default();
        println!("Guard watches the same innkeeper: {}", watching.same_object(inn));
    }

    Ok(())
}
