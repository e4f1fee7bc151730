use crate::model::{AnnotatedBug, BugRecord, ClusterError};

/// Pairs each record with the label at the same index.
pub fn annotate<'a>(
    records: &'a [BugRecord],
    labels: &[usize],
) -> Result<Vec<AnnotatedBug<'a>>, ClusterError> {
    if records.len() != labels.len() {
        return Err(ClusterError::InvalidInput(format!(
            "{} labels for {} records",
            labels.len(),
            records.len()
        )));
    }
    Ok(records
        .iter()
        .zip(labels)
        .map(|(bug, &cluster)| AnnotatedBug { bug, cluster })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BugStatus;

    fn records(n: u64) -> Vec<BugRecord> {
        (0..n)
            .map(|id| BugRecord {
                id: 100 + id,
                title: format!("bug {id}"),
                description: String::new(),
                status: BugStatus::New,
                created_at: None,
                updated_at: None,
            })
            .collect()
    }

    #[test]
    fn keeps_order_and_labels() {
        let bugs = records(5);
        let labels = [0, 1, 0, 2, 1];
        let annotated = annotate(&bugs, &labels).unwrap();
        assert_eq!(annotated.len(), 5);
        for (i, item) in annotated.iter().enumerate() {
            assert_eq!(item.bug.id, 100 + i as u64);
            assert_eq!(item.cluster, labels[i]);
            assert!(std::ptr::eq(item.bug, &bugs[i]));
        }
    }

    #[test]
    fn length_mismatch_is_invalid() {
        let bugs = records(3);
        let err = annotate(&bugs, &[0, 1]).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidInput(_)));
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(annotate(&[], &[]).unwrap().is_empty());
    }
}
