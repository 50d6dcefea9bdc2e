use super::model::TrialRecord;

/// Status groups counted as a discontinued trial.
pub const DISCONTINUED_STATUSES: [&str; 2] = ["Terminated", "Withdrawn"];

/// Status group counted as completed.
pub const COMPLETED_STATUS: &str = "Completed";

// ---------------------------------------------------------------------------
// KpiSet – the portfolio KPI row
// ---------------------------------------------------------------------------

/// Summary statistics over a (possibly empty) set of trials.
///
/// Medians are `None` when no trial in the set has a value for the column;
/// rates are `0.0` for an empty set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KpiSet {
    pub trial_count: usize,
    pub median_duration_days: Option<f64>,
    pub discontinuation_rate: f64,
    pub median_enrollment: Option<f64>,
    pub completed_fraction: f64,
}

/// Compute the KPI row over the given trials.
pub fn aggregate<'a, I>(records: I) -> KpiSet
where
    I: IntoIterator<Item = &'a TrialRecord>,
{
    let mut trial_count = 0usize;
    let mut discontinued = 0usize;
    let mut completed = 0usize;
    let mut durations = Vec::new();
    let mut enrollments = Vec::new();

    for rec in records {
        trial_count += 1;
        match rec.status_group.as_deref() {
            Some(s) if DISCONTINUED_STATUSES.contains(&s) => discontinued += 1,
            Some(COMPLETED_STATUS) => completed += 1,
            _ => {}
        }
        durations.extend(rec.duration_start_to_completion_days);
        enrollments.extend(rec.enrollment_count);
    }

    KpiSet {
        trial_count,
        median_duration_days: median(&mut durations),
        discontinuation_rate: rate(discontinued, trial_count),
        median_enrollment: median(&mut enrollments),
        completed_fraction: rate(completed, trial_count),
    }
}

/// Median of the values, averaging the two middle ones for an even count.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

fn rate(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// ---------------------------------------------------------------------------
// Display helpers for the KPI cards
// ---------------------------------------------------------------------------

/// Placeholder shown for an unavailable median.
pub const UNAVAILABLE: &str = "—";

impl KpiSet {
    pub fn trials_label(&self) -> String {
        group_thousands(self.trial_count as i64)
    }

    pub fn median_duration_label(&self) -> String {
        median_label(self.median_duration_days)
    }

    pub fn median_enrollment_label(&self) -> String {
        median_label(self.median_enrollment)
    }

    pub fn discontinuation_label(&self) -> String {
        percent_label(self.discontinuation_rate)
    }

    pub fn completed_label(&self) -> String {
        percent_label(self.completed_fraction)
    }
}

/// Medians are shown truncated to whole units.
fn median_label(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_finite() => v.to_string(),
        Some(v) => group_thousands(v.trunc() as i64),
        None => UNAVAILABLE.to_string(),
    }
}

fn percent_label(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(status: Option<&str>, duration: Option<f64>, enrollment: Option<f64>) -> TrialRecord {
        TrialRecord {
            status_group: status.map(String::from),
            duration_start_to_completion_days: duration,
            enrollment_count: enrollment,
            ..Default::default()
        }
    }

    #[test]
    fn empty_subset_is_total() {
        let kpis = aggregate(&Vec::<TrialRecord>::new());
        assert_eq!(kpis.trial_count, 0);
        assert_eq!(kpis.discontinuation_rate, 0.0);
        assert_eq!(kpis.completed_fraction, 0.0);
        assert_eq!(kpis.median_duration_days, None);
        assert_eq!(kpis.median_enrollment, None);
    }

    #[test]
    fn phase_two_scenario() {
        let subset = vec![
            trial(Some("Completed"), Some(400.0), Some(120.0)),
            trial(None, None, None),
        ];
        let kpis = aggregate(&subset);
        assert_eq!(kpis.trial_count, 2);
        assert_eq!(kpis.median_duration_days, Some(400.0));
        assert_eq!(kpis.median_enrollment, Some(120.0));
        assert_eq!(kpis.discontinuation_rate, 0.0);
        assert_eq!(kpis.completed_fraction, 0.5);
    }

    #[test]
    fn all_absent_values_make_median_unavailable() {
        let subset = vec![trial(Some("Completed"), None, None); 3];
        let kpis = aggregate(&subset);
        assert_eq!(kpis.trial_count, 3);
        assert_eq!(kpis.median_duration_days, None);
        assert_eq!(kpis.median_duration_label(), UNAVAILABLE);
        assert_eq!(kpis.completed_fraction, 1.0);
    }

    #[test]
    fn even_sample_median_averages_middle_values() {
        assert_eq!(median(&mut [300.0, 100.0, 200.0, 400.0]), Some(250.0));
        assert_eq!(median(&mut [5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&mut Vec::new()), None);
    }

    #[test]
    fn zero_is_a_value_not_an_absence() {
        let subset = vec![trial(None, Some(0.0), Some(0.0)), trial(None, None, None)];
        let kpis = aggregate(&subset);
        assert_eq!(kpis.median_duration_days, Some(0.0));
        assert_eq!(kpis.median_enrollment, Some(0.0));
    }

    #[test]
    fn infinite_values_take_part_in_the_median() {
        let subset = vec![
            trial(None, Some(f64::INFINITY), Some(10.0)),
            trial(None, Some(f64::INFINITY), Some(20.0)),
            trial(None, Some(100.0), Some(f64::INFINITY)),
        ];
        let kpis = aggregate(&subset);
        assert_eq!(kpis.median_duration_days, Some(f64::INFINITY));
        assert_eq!(kpis.median_enrollment, Some(20.0));
        assert_eq!(kpis.median_duration_label(), "inf");
    }

    #[test]
    fn withdrawn_and_terminated_count_as_discontinued() {
        let subset = vec![
            trial(Some("Terminated"), None, None),
            trial(Some("Withdrawn"), None, None),
            trial(Some("Completed"), None, None),
            trial(Some("Recruiting"), None, None),
        ];
        let kpis = aggregate(&subset);
        assert_eq!(kpis.discontinuation_rate, 0.5);
        assert_eq!(kpis.completed_fraction, 0.25);
    }

    #[test]
    fn adding_a_terminated_trial_never_lowers_discontinuation() {
        let mut subset = vec![
            trial(Some("Completed"), None, None),
            trial(Some("Withdrawn"), None, None),
            trial(None, None, None),
        ];
        let mut previous = aggregate(&subset).discontinuation_rate;
        for _ in 0..5 {
            subset.push(trial(Some("Terminated"), None, None));
            let next = aggregate(&subset).discontinuation_rate;
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn labels_match_dashboard_formatting() {
        let kpis = KpiSet {
            trial_count: 12_345,
            median_duration_days: Some(1_234.9),
            discontinuation_rate: 0.125,
            median_enrollment: None,
            completed_fraction: 2.0 / 3.0,
        };
        assert_eq!(kpis.trials_label(), "12,345");
        assert_eq!(kpis.median_duration_label(), "1,234");
        assert_eq!(kpis.median_enrollment_label(), UNAVAILABLE);
        assert_eq!(kpis.discontinuation_label(), "12.5%");
        assert_eq!(kpis.completed_label(), "66.7%");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(-1000), "-1,000");
    }
}
