use std::ops::ControlFlow;

use arbor::tree::Arbor;
use arbor::tree::ArborConfig;
use arbor::tree::Direction;
use arbor::tree::LessThan;
use arbor::tree::Rebalance;

use anyhow::Result;

fn main() -> Result<()> {
    // Order words by length, then alphabetically
    let by_length = LessThan(|a: &&str, b: &&str| (a.len(), *a) < (b.len(), *b));
    let config = ArborConfig::default()
        .with_order(3)
        .with_rebalance(Rebalance::Merge);
    let mut tree = Arbor::try_with_config(config, by_length)?;

    for word in "the quick brown fox jumps over the lazy dog".split_whitespace() {
        tree.insert(word);
    }
    tree.verify_fanout()?;

    println!("Tree:");
    tree.print_tree();

    println!("Shortest first:");
    tree.print_keys(Direction::Ascending);

    println!("Three longest:");
    let mut seen = 0;
    tree.traverse_keys(Direction::Descending, |word| {
        println!("{word}");
        seen += 1;
        if seen == 3 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    tree.remove(&"fox");
    tree.remove(&"dog");
    println!(
        "After removals: {} keys in {} nodes, height {}, {:.1}% leaf utilization",
        tree.count(),
        tree.node_count(),
        tree.height(),
        100.0 * tree.utilization()
    );
    Ok(())
}
