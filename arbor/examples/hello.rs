use arbor::tree::Arbor;
use arbor::tree::NaturalOrder;

use anyhow::Result;

fn main() -> Result<()> {
    // Create a tree holding at most 7 keys per node
    let mut tree = Arbor::<String, NaturalOrder>::try_new(7, NaturalOrder)?;

    // Make sure we can't find "something" in our tree
    assert!(!tree.contains(&"something".to_string()));
    assert_eq!(tree.find(&"something".to_string()), None);

    tree.insert("something".to_string());

    // Make sure we can find "something" in our tree
    assert!(tree.contains(&"something".to_string()));
    assert_eq!(tree.find(&"something".to_string()), Some(tree.root()));

    tree.remove(&"something".to_string());
    assert!(tree.is_empty());
    Ok(())
}
