//! Stock special types and registering your own.
//!
//! Run with: cargo run --example special_types

use rmxml::special::{Rect, Table, Tone};
use rmxml::{
    generate_with, parse_with, CodecOptions, Generator, Parser, Result, Special, SpecialDecode,
    TreeNode, TypeRegistry, Value,
};
use std::any::Any;

/// An audio cue: file name, volume and pitch.
#[derive(Debug, PartialEq)]
struct AudioFile {
    name: String,
    volume: i64,
    pitch: i64,
}

impl Special for AudioFile {
    fn class_name(&self) -> &str {
        "AudioFile"
    }

    fn encode(&self, generator: &mut Generator<'_>, node: &mut TreeNode) -> Result<()> {
        generator.add_child(node, &Value::from(self.name.as_str()))?;
        generator.add_child(node, &Value::from(self.volume))?;
        generator.add_child(node, &Value::from(self.pitch))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_special(&self, other: &dyn Special) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }
}

impl SpecialDecode for AudioFile {
    const TAG: &'static str = "audio";

    fn decode(parser: &mut Parser<'_>, node: &TreeNode) -> Result<Self> {
        parser.expect_children(node, 3)?;
        let name = match parser.load_child(node, 0)? {
            Value::Str(name) => name,
            _ => return Err(parser.malformed(node, "audio name must be a string")),
        };
        Ok(AudioFile {
            name,
            volume: parser.child_i64(node, 1)?,
            pitch: parser.child_i64(node, 2)?,
        })
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut registry = TypeRegistry::default();
    registry.register::<AudioFile>()?;

    let mut passages = Table::new_2d(3, 2);
    passages.set(1, 0, 0, 15);
    passages.set(2, 1, 0, 7);

    let scene = Value::Array(vec![
        Value::special(passages),
        Value::special(Tone::new(-34.0, -34.0, 0.0, 68.0)),
        Value::special(Rect::new(0, 0, 640, 480)),
        Value::special(AudioFile {
            name: "Town01".to_string(),
            volume: 100,
            pitch: 100,
        }),
    ]);

    let tree = generate_with(&scene, &registry, CodecOptions::new())?;
    for child in &tree.children {
        println!(
            "<{}> class-name={:?} with {} children",
            child.tag,
            child.attribute("class-name").unwrap_or_default(),
            child.children.len()
        );
    }

    let back = parse_with(&tree, &registry, CodecOptions::new())?;
    assert_eq!(back, scene);

    if let Some(table) = back.as_array().and_then(|items| items[0].downcast_special::<Table>()) {
        println!("\npassage at (1, 0): {:?}", table.get(1, 0, 0));
    }
    println!("✓ Round-trip successful");

    Ok(())
}
