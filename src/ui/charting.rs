use crate::session::Response;

/// (trial number, reaction time) pairs, trials numbered from 1
pub fn reaction_points(responses: &[Response]) -> Vec<(f64, f64)> {
    responses
        .iter()
        .enumerate()
        .map(|(i, r)| ((i + 1) as f64, r.reaction_time_seconds))
        .collect()
}

/// X (trials) and Y (seconds) upper bounds for the results chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let slowest = points.iter().map(|&(_, rt)| rt).fold(0.0, f64::max);
    let last_trial = points.last().map_or(1.0, |p| p.0).max(1.0);

    (last_trial, slowest.ceil().max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
