//! Equivalence rules between two observations

use std::fmt;
use std::mem;
use std::sync::Arc;

use super::observation::Observation;

type ValueCompareFn<T> = dyn Fn(&T, &T) -> bool + Send + Sync;
type ErrorCompareFn<E> = dyn Fn(&E, &E) -> bool + Send + Sync;

/// Decides whether a candidate observation matches the control's
///
/// Errors are compared by category first: a mismatch in error presence or
/// category is never rescued by the value predicate. The default category
/// is the enum variant of the error.
pub struct Comparator<T, E> {
    values: Arc<ValueCompareFn<T>>,
    errors: Arc<ErrorCompareFn<E>>,
}

impl<T: 'static, E: 'static> Comparator<T, E> {
    /// Create a comparator with a custom value predicate
    pub fn new<F>(values: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            values: Arc::new(values),
            errors: Arc::new(same_variant::<E>),
        }
    }

    /// Replace the value predicate
    pub fn with_values<F>(mut self, values: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.values = Arc::new(values);
        self
    }

    /// Replace the error category predicate
    pub fn with_errors<F>(mut self, errors: F) -> Self
    where
        F: Fn(&E, &E) -> bool + Send + Sync + 'static,
    {
        self.errors = Arc::new(errors);
        self
    }
}

impl<T, E> Comparator<T, E> {
    /// Check whether two observations are equivalent
    ///
    /// A panicked observation is equivalent to nothing, not even another panic.
    pub fn compare(&self, control: &Observation<T, E>, candidate: &Observation<T, E>) -> bool {
        match (control.outcome(), candidate.outcome()) {
            (Some(Ok(a)), Some(Ok(b))) => (self.values)(a, b),
            (Some(Err(a)), Some(Err(b))) => (self.errors)(a, b),
            _ => false,
        }
    }
}

impl<T: PartialEq + 'static, E: 'static> Default for Comparator<T, E> {
    fn default() -> Self {
        Self::new(|a: &T, b: &T| a == b)
    }
}

impl<T, E> Clone for Comparator<T, E> {
    fn clone(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
            errors: Arc::clone(&self.errors),
        }
    }
}

impl<T, E> fmt::Debug for Comparator<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparator").finish_non_exhaustive()
    }
}

fn same_variant<E>(a: &E, b: &E) -> bool {
    mem::discriminant(a) == mem::discriminant(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug)]
    enum LookupError {
        NotFound(String),
        Timeout,
    }

    fn ok(value: i32) -> Observation<i32, LookupError> {
        Observation::value(value, Duration::ZERO)
    }

    fn err(error: LookupError) -> Observation<i32, LookupError> {
        Observation::error(error, Duration::ZERO)
    }

    #[test]
    fn test_equal_values_match() {
        let comparator = Comparator::default();
        assert!(comparator.compare(&ok(42), &ok(42)));
        assert!(!comparator.compare(&ok(42), &ok(41)));
    }

    #[test]
    fn test_observation_matches_itself() {
        let comparator = Comparator::default();
        let observation = ok(7);
        assert!(comparator.compare(&observation, &observation));
    }

    #[test]
    fn test_error_presence_mismatch() {
        let comparator = Comparator::new(|_: &i32, _: &i32| true);

        assert!(!comparator.compare(&ok(1), &err(LookupError::Timeout)));
        assert!(!comparator.compare(&err(LookupError::Timeout), &ok(1)));
    }

    #[test]
    fn test_errors_compare_by_variant() {
        let comparator = Comparator::default();

        assert!(comparator.compare(
            &err(LookupError::NotFound("a".into())),
            &err(LookupError::NotFound("b".into()))
        ));
        assert!(!comparator.compare(
            &err(LookupError::NotFound("a".into())),
            &err(LookupError::Timeout)
        ));
    }

    #[test]
    fn test_custom_value_predicate() {
        let comparator = Comparator::default().with_values(|a: &i32, b: &i32| (a - b).abs() <= 1);

        assert!(comparator.compare(&ok(10), &ok(11)));
        assert!(!comparator.compare(&ok(10), &ok(12)));
    }

    #[test]
    fn test_custom_error_predicate() {
        let comparator = Comparator::<i32, LookupError>::default().with_errors(|_, _| false);

        assert!(!comparator.compare(&err(LookupError::Timeout), &err(LookupError::Timeout)));
    }

    #[test]
    fn test_panics_never_match() {
        let comparator = Comparator::new(|_: &i32, _: &i32| true).with_errors(|_, _| true);
        let panicked = || Observation::panicked("boom", Duration::ZERO);

        assert!(!comparator.compare(&ok(1), &panicked()));
        assert!(!comparator.compare(&err(LookupError::Timeout), &panicked()));
        assert!(!comparator.compare(&panicked(), &ok(1)));
        assert!(!comparator.compare(&panicked(), &panicked()));
    }

    #[test]
    fn test_non_enum_errors_share_a_category() {
        let comparator = Comparator::<i32, String>::default();
        let a = Observation::error("first".to_string(), Duration::ZERO);
        let b = Observation::error("second".to_string(), Duration::ZERO);

        assert!(comparator.compare(&a, &b));
    }
}
