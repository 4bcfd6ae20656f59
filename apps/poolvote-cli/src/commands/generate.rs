use poolvote_batch_tx::Signer;
use poolvote_sdk::generate_signers;
use tracing::info;

/// Create `count` fresh random signers
pub fn execute(count: usize) -> Vec<Signer> {
    let signers = generate_signers(count);
    info!(count = signers.len(), "Generated signers");
    signers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_requested_count() {
        assert_eq!(execute(0).len(), 0);

        let signers = execute(3);
        assert_eq!(signers.len(), 3);
        assert_ne!(signers[0], signers[1]);
    }
}
