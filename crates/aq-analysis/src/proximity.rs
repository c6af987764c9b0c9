//! Proximity ordering of nodes around a reference coordinate.

use aq_core::GeoCoord;
use aq_network::Network;

use crate::error::AnalysisResult;

/// Sort `ids` by ascending great-circle distance to `reference`, breaking
/// exact-distance ties by ascending id. The sort is stable.
pub fn order_by_proximity(
    net: &Network,
    reference: GeoCoord,
    ids: &[String],
) -> AnalysisResult<Vec<String>> {
    let mut ranked: Vec<(f64, String)> = Vec::with_capacity(ids.len());
    for id in ids {
        let node = net.node(id)?;
        ranked.push((node.coord().distance_km(reference), id.clone()));
    }
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(ranked.into_iter().map(|(_, id)| id).collect())
}
