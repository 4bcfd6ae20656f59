/// Transaction-level code reported when one or more operations failed
pub const TX_FAILED: &str = "tx_failed";

/// Operation-level code for an operation that would have applied on its own
pub const OP_SUCCESS: &str = "op_success";

/// How a rejected transaction's result codes should be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    /// Indices of the operations that succeeded, ascending
    pub survivors: Vec<usize>,
    /// True only for the operation-caused failure marker
    pub is_partial_failure: bool,
}

/// Map a rejection's codes to the operations worth retrying
///
/// Any transaction code other than `tx_failed` yields no survivors; the caller
/// must treat it as a full abort.
pub fn interpret<S: AsRef<str>>(transaction_code: &str, operation_codes: &[S]) -> Interpretation {
    if transaction_code != TX_FAILED {
        return Interpretation {
            survivors: Vec::new(),
            is_partial_failure: false,
        };
    }

    let survivors = operation_codes
        .iter()
        .enumerate()
        .filter(|(_, code)| code.as_ref() == OP_SUCCESS)
        .map(|(index, _)| index)
        .collect();

    Interpretation {
        survivors,
        is_partial_failure: true,
    }
}

/// Keep the items at `indices` (ascending), in order
pub fn retain_survivors<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices
        .iter()
        .filter_map(|&index| items.get(index).cloned())
        .collect()
}
