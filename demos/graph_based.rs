use recsys_engine::methodology::TestItemsMethodology;
use recsys_engine::{GraphBasedRS, InteractionGraph, PersonalizedPageRank, Ratings};
use tracing_subscriber::EnvFilter;

fn main() -> recsys_engine::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let train = Ratings::from_uir([
        ("ann", "matrix", 5.0),
        ("ann", "alien", 4.0),
        ("bob", "matrix", 5.0),
        ("bob", "arrival", 5.0),
        ("cid", "notebook", 4.0),
        ("cid", "titanic", 5.0),
    ]);
    let test = Ratings::from_uir([
        ("ann", "arrival", 5.0),
        ("bob", "alien", 3.0),
        ("cid", "matrix", 1.0),
        ("dan", "matrix", 4.0),
    ]);

    // build graph
    let graph = InteractionGraph::from_ratings(&train);
    println!("nodes: {}, edges: {}", graph.node_count(), graph.edge_count());

    let mut rs = GraphBasedRS::new(PersonalizedPageRank::new(0.85, 100, 1.0e-8)?, graph);
    // dan is not in the graph: a coverage warning is emitted
    let rank = rs.rank(&test, Some(3), None, Some(&TestItemsMethodology::new()))?;

    for (position, record) in rank.iter_ranked() {
        println!("{} #{} {} ({:.4})", record.user_id, position, record.item_id, record.score);
    }
    println!("{:?}", rs.report());
    Ok(())
}
