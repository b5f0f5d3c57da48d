//! Stratified train/test partitioning.

use std::collections::BTreeMap;

use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use road_severity_accident_models::SeverityLevel;

use crate::ModelError;

/// Row indices of the two partitions, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StratifiedSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of test rows for `n` rows: `ceil(test_fraction * n)`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    ((test_fraction * n as f64).ceil() as usize).min(n)
}

/// Distributes `n_test` rows over classes in proportion to their sizes
/// (largest remainder), keeping at least one row of every class on each
/// side.
fn allocate(counts: &[usize], n: usize, n_test: usize) -> Vec<usize> {
    let mut alloc: Vec<usize> = counts.iter().map(|&c| n_test * c / n).collect();
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(n_test * counts[i] % n));

    let assigned: usize = alloc.iter().sum();
    for &i in order.iter().take(n_test - assigned) {
        alloc[i] += 1;
    }

    for (a, &c) in alloc.iter_mut().zip(counts) {
        *a = (*a).clamp(1, c - 1);
    }

    loop {
        let assigned: usize = alloc.iter().sum();
        if assigned == n_test {
            break;
        }
        let candidate = if assigned < n_test {
            order.iter().copied().find(|&i| alloc[i] < counts[i] - 1)
        } else {
            (0..alloc.len())
                .filter(|&i| alloc[i] > 1)
                .max_by_key(|&i| alloc[i])
        };
        let Some(i) = candidate else {
            break;
        };
        if assigned < n_test {
            alloc[i] += 1;
        } else {
            alloc[i] -= 1;
        }
    }

    alloc
}

/// Splits row indices into train and test partitions that preserve the
/// proportion of each target class.
///
/// Both severity classes must be present with at least two rows each.
///
/// # Errors
///
/// * [`ModelError::InvalidParameter`] if `test_fraction` is not in `(0, 1)`
/// * [`ModelError::EmptyTrainingSet`] if `targets` is empty
/// * [`ModelError::Stratification`] if a class has fewer than two rows
/// * [`ModelError::SplitTooSmall`] if either partition would hold fewer
///   rows than there are classes
pub fn stratified_split(
    targets: &[u8],
    test_fraction: f64,
    seed: u64,
) -> Result<StratifiedSplit, ModelError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ModelError::InvalidParameter(format!(
            "test fraction must be between 0 and 1, got {test_fraction}"
        )));
    }
    if targets.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }

    let mut by_class: BTreeMap<u8, Vec<usize>> = SeverityLevel::ALL
        .iter()
        .map(|level| (level.id(), Vec::new()))
        .collect();
    for (i, &t) in targets.iter().enumerate() {
        by_class
            .entry(SeverityLevel::from_id(t).id())
            .or_default()
            .push(i);
    }

    for (&class, members) in &by_class {
        if members.len() < 2 {
            return Err(ModelError::Stratification {
                class: SeverityLevel::from_id(class).report_name().to_string(),
                count: members.len(),
            });
        }
    }

    let n = targets.len();
    let n_test = test_size(n, test_fraction);
    let n_train = n - n_test;
    let classes = by_class.len();
    if n_test < classes || n_train < classes {
        return Err(ModelError::SplitTooSmall {
            total: n,
            train: n_train,
            test: n_test,
            classes,
        });
    }

    let counts: Vec<usize> = by_class.values().map(Vec::len).collect();
    let alloc = allocate(&counts, n, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (mut members, take) in by_class.into_values().zip(alloc) {
        members.shuffle(&mut rng);
        test.extend_from_slice(&members[..take]);
        train.extend_from_slice(&members[take..]);
    }
    train.sort_unstable();
    test.sort_unstable();

    log::debug!(
        "Stratified split: {} train / {} test rows (seed={seed})",
        train.len(),
        test.len()
    );

    Ok(StratifiedSplit { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn severe_count(targets: &[u8], rows: &[usize]) -> usize {
        rows.iter().filter(|&&i| targets[i] == 1).count()
    }

    #[test]
    fn test_size_rounds_up() {
        assert_eq!(test_size(10, 0.3), 3);
        assert_eq!(test_size(11, 0.3), 4);
        assert_eq!(test_size(100, 0.3), 30);
    }

    #[test]
    fn preserves_class_proportions() {
        let targets: Vec<u8> = (0..100).map(|i| u8::from(i % 5 == 0)).collect();

        let split = stratified_split(&targets, 0.3, 42).unwrap();

        assert_eq!(split.test.len(), 30);
        assert_eq!(split.train.len(), 70);
        assert_eq!(severe_count(&targets, &split.test), 6);
        assert_eq!(severe_count(&targets, &split.train), 14);
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let targets: Vec<u8> = (0..37).map(|i| u8::from(i % 3 == 0)).collect();
        let split = stratified_split(&targets, 0.3, 7).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..37).collect::<Vec<_>>());
        assert!(split.train.windows(2).all(|w| w[0] < w[1]));
        assert!(split.test.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn small_minority_lands_on_both_sides() {
        let targets = [0, 0, 1, 0, 0, 1, 0, 1, 0, 0];
        let split = stratified_split(&targets, 0.3, 42).unwrap();

        assert_eq!(split.test.len(), 3);
        assert_eq!(severe_count(&targets, &split.test), 1);
        assert_eq!(severe_count(&targets, &split.train), 2);
    }

    #[test]
    fn deterministic_for_a_seed() {
        let targets: Vec<u8> = (0..50).map(|i| u8::from(i % 4 == 0)).collect();
        let a = stratified_split(&targets, 0.3, 42).unwrap();
        let b = stratified_split(&targets, 0.3, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sparse_class_fails() {
        let targets = [0, 0, 0, 0, 1];
        let err = stratified_split(&targets, 0.3, 42).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Stratification { ref class, count: 1 } if class == "Grave"
        ));

        let targets = [0, 0, 0, 0];
        assert!(matches!(
            stratified_split(&targets, 0.3, 42),
            Err(ModelError::Stratification { count: 0, .. })
        ));
    }

    #[test]
    fn too_small_partition_fails() {
        let targets = [0, 0, 1, 1];
        assert!(matches!(
            stratified_split(&targets, 0.1, 42),
            Err(ModelError::SplitTooSmall { test: 1, .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_fraction() {
        let targets = [0, 0, 1, 1];
        assert!(matches!(
            stratified_split(&targets, 1.0, 42),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(
            stratified_split(&targets, 0.0, 42),
            Err(ModelError::InvalidParameter(_))
        ));
    }
}
