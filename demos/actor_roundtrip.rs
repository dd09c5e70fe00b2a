//! Dump a game actor to a JSON document and read it back.
//!
//! The tree is the part `rmxml` owns; `serde_json` stands in for the markup
//! writer that would turn it into a file.
//!
//! Run with: cargo run --example actor_roundtrip

use rmxml::special::Color;
use rmxml::{from_tree, to_tree, TreeNode};
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Actor {
    id: u32,
    name: String,
    nickname: String,
    class_id: u32,
    level: u32,
    exp: u64,
    skills: Vec<u16>,
    equips: [Option<u16>; 5],
    state: State,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
enum State {
    Normal,
    Poisoned { turns: u8 },
}

fn main() -> Result<(), Box<dyn Error>> {
    let actor = Actor {
        id: 1,
        name: "Ralph".to_string(),
        nickname: "The Brave".to_string(),
        class_id: 1,
        level: 12,
        exp: 18_446_744_073_709_551_615,
        skills: vec![57, 61, 80],
        equips: [Some(1), Some(1), None, Some(5), None],
        state: State::Poisoned { turns: 3 },
    };

    let tree = to_tree(&actor)?;
    let document = serde_json::to_string_pretty(&tree)?;
    println!("Document:\n{}\n", document);

    let tree_back: TreeNode = serde_json::from_str(&document)?;
    let actor_back: Actor = from_tree(&tree_back)?;
    assert_eq!(actor, actor_back);
    println!("✓ Round-trip successful: {:?}", actor_back);

    // Special values keep their compact encoding inside a document too
    let tint = rmxml::generate(&rmxml::Value::special(Color::rgb(255.0, 64.0, 0.0)))?;
    println!("\nColor node: {}", serde_json::to_string(&tint)?);

    Ok(())
}
