use std::sync::Arc;

use recsys_engine::evaluation::{Precision, Recall};
use recsys_engine::methodology::TestRatingsMethodology;
use recsys_engine::{
    CentroidVector, ContentBasedRS, EvalModel, ItemContent, MemoryItemsLoader, Ratings, RecSysConfig,
    TracingObserver,
};
use tracing_subscriber::EnvFilter;

fn main() -> recsys_engine::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // item content
    let loader = MemoryItemsLoader::new([
        ItemContent::new("matrix", [("scifi", 1.0), ("action", 0.6)]),
        ItemContent::new("alien", [("scifi", 0.9), ("horror", 0.7)]),
        ItemContent::new("heat", [("crime", 1.0), ("action", 0.8)]),
        ItemContent::new("notebook", [("romance", 1.0)]),
        ItemContent::new("arrival", [("scifi", 1.0), ("drama", 0.5)]),
        ItemContent::new("titanic", [("romance", 0.8), ("drama", 0.7)]),
    ]);

    // train / test split
    let train = Ratings::from_uir([
        ("ann", "matrix", 5.0),
        ("ann", "notebook", 1.0),
        ("bob", "notebook", 5.0),
        ("bob", "heat", 2.0),
        ("cid", "heat", 1.0),
    ]);
    let test = Ratings::from_uir([
        ("ann", "arrival", 5.0),
        ("ann", "titanic", 2.0),
        ("bob", "titanic", 4.0),
        ("bob", "alien", 1.0),
        ("cid", "matrix", 3.0),
    ]);

    // RECSYS_N_JOBS / RECSYS_PROGRESS_EVERY
    let config = RecSysConfig::from_env()?;
    let observer = Arc::new(TracingObserver::new(config.progress_every));

    let mut rs = ContentBasedRS::new(CentroidVector::new(Some(3.0)), train, loader)
        .with_config(config)?
        .with_observer(observer);

    let rank = rs.fit_rank(&test, Some(2), None, Some(&TestRatingsMethodology::new()), true)?;
    for (position, record) in rank.iter_ranked() {
        println!("{} #{} {} ({:.3})", record.user_id, position, record.item_id, record.score);
    }
    if let Some(report) = rs.report() {
        println!("skipped users: {:?}", report.skipped_users);
    }

    // evaluation
    let mut eval = EvalModel::new(vec![rank.into_ratings()], vec![test], vec![Box::new(Precision::new())])?;
    eval.append_metric(Box::new(Recall::new()));
    let (system, users) = eval.fit(None);
    println!("{:?}", system);
    println!("{:?}", users);
    Ok(())
}
