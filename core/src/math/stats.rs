pub struct StatsHelper;

impl StatsHelper {
    /// Arithmetic mean from an accumulated sum, `None` when nothing was accumulated.
    pub fn mean_of(sum: f64, count: usize) -> Option<f64> {
        if count == 0 {
            return None;
        }
        Some(sum / count as f64)
    }

    /// Returns the value when every element is identical, `None` when the
    /// sequence is empty or holds more than one distinct value.
    pub fn uniform_value<I>(values: I) -> Option<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        if iter.all(|v| v.total_cmp(&first).is_eq()) {
            Some(first)
        } else {
            None
        }
    }

    pub fn to_db(linear: f64) -> f64 {
        10.0 * linear.log10()
    }

    pub fn db_to_linear(db: f64) -> f64 {
        10f64.powf(db / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_accumulator_is_none() {
        assert_eq!(StatsHelper::mean_of(0.0, 0), None);
        assert_eq!(StatsHelper::mean_of(6.0, 3), Some(2.0));
    }

    #[test]
    fn uniform_value_detects_mixed_sequences() {
        assert_eq!(StatsHelper::uniform_value(vec![38000.0; 4]), Some(38000.0));
        assert_eq!(StatsHelper::uniform_value(vec![38000.0, 38001.0]), None);
        assert_eq!(StatsHelper::uniform_value(Vec::new()), None);
    }

    #[test]
    fn db_conversions_invert_each_other() {
        assert!((StatsHelper::to_db(100.0) - 20.0).abs() < 1e-12);
        assert!((StatsHelper::db_to_linear(-30.0) - 1e-3).abs() < 1e-15);
    }
}
