//! # Segment Sync
//!
//! The reorg-aware splice: extending segments with headers fetched from the
//! execution node and folding an update segment into an existing one.

use crate::domain::{ChainFollowerError, ChainSegment, MAX_POLL_BLOCKS};
use crate::ports::ExecutionClient;

/// Outcome of [`update_latest`].
#[derive(Clone, Debug)]
pub struct UpdateLatestResult {
    /// The full new segment with the reorg applied.
    pub full: ChainSegment,
    /// Blocks of the old segment that are no longer canonical.
    pub removed: Option<ChainSegment>,
    /// New blocks that were not part of the old segment, including
    /// replacement blocks from a reorg.
    pub updated: Option<ChainSegment>,
}

fn cap_poll_blocks(n: u64) -> u64 {
    n.clamp(1, MAX_POLL_BLOCKS)
}

/// Prepend up to `n` parent headers fetched from the client. Aborts with
/// `Reorg` when the server's parent-by-number disagrees with the segment's
/// leftmost parent hash, which means the segment is on a reorged-away
/// branch (or the server reorged mid-loop).
pub async fn extend_left(
    segment: &mut ChainSegment,
    client: &dyn ExecutionClient,
    mut n: u64,
) -> Result<(), ChainFollowerError> {
    while n > 0 {
        let leftmost = segment.earliest().clone();
        if leftmost.number == 0 {
            break;
        }
        let header = client.header_by_number(leftmost.number - 1).await?;
        if header.hash != leftmost.parent_hash {
            return Err(ChainFollowerError::Reorg);
        }
        segment.push_front(header);
        n -= 1;
    }
    Ok(())
}

/// Fetch `n` headers right of `segment.latest()`, verifying the parent-hash
/// chain block by block. `Reorg` on any mismatch.
pub async fn new_segment_right(
    segment: &ChainSegment,
    client: &dyn ExecutionClient,
    n: u64,
) -> Result<ChainSegment, ChainFollowerError> {
    let mut previous = segment.latest().clone();
    let mut headers = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let header = client.header_by_number(previous.number + 1).await?;
        if header.parent_hash != previous.hash {
            return Err(ChainFollowerError::Reorg);
        }
        headers.push(header.clone());
        previous = header;
    }
    ChainSegment::new(headers)
}

/// Fold `update` into `segment`, backtracking the update until it connects
/// to a common ancestor:
///
/// - gap between the segments: extend `update` left by at most
///   [`MAX_POLL_BLOCKS`] blocks and retry;
/// - block numbers align and the parent hash matches: a pure append;
/// - block numbers align but the parent hash differs: a reorg branching
///   within `segment`; extend `update` left by the segment length and retry;
/// - overlap: compare left-aligned over the overlap and splice the diff.
///
/// `UpdateTooFarInPast` when the update reaches below `segment.earliest()`;
/// the local tail cannot replay such a reorg.
pub async fn update_latest(
    segment: &ChainSegment,
    client: &dyn ExecutionClient,
    update: ChainSegment,
) -> Result<UpdateLatestResult, ChainFollowerError> {
    let mut update = update;
    loop {
        if update.earliest().number < segment.earliest().number {
            return Err(ChainFollowerError::UpdateTooFarInPast {
                segment_earliest: segment.earliest().number,
                update_earliest: update.earliest().number,
            });
        }
        let latest = segment.latest();
        let update_earliest = update.earliest().clone();

        if update_earliest.number > latest.number + 1 {
            // Gap: backtrack the update towards the segment.
            let gap = update_earliest.number - latest.number - 1;
            extend_left(&mut update, client, cap_poll_blocks(gap)).await?;
            continue;
        }

        if update_earliest.number == latest.number + 1 {
            if update_earliest.parent_hash == latest.hash {
                // The new segment extends the old one perfectly.
                let mut full = segment.clone();
                full.add_right(&update);
                return Ok(UpdateLatestResult {
                    full,
                    removed: None,
                    updated: Some(update),
                });
            }
            // Numbers align but the update branches off within the old
            // segment; backtrack far enough to cover it.
            extend_left(&mut update, client, cap_poll_blocks(segment.len() as u64)).await?;
            continue;
        }

        // Overlap: diff the overlapping suffix against the update.
        let overlap = (latest.number - update_earliest.number + 1) as usize;
        let (removed, updated) = segment.latest_n(overlap).diff_left_aligned(&update);

        let mut headers = segment.headers().to_vec();
        if let Some(removed) = &removed {
            headers.truncate(headers.len() - removed.len());
        }
        if let Some(updated) = &updated {
            headers.extend_from_slice(updated.headers());
        }
        let full = ChainSegment::new(headers)?;
        return Ok(UpdateLatestResult {
            full,
            removed,
            updated,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockExecutionClient;
    use crate::testing::{fork_chain, header_chain};

    fn segment(headers: Vec<shared_types::Header>) -> ChainSegment {
        ChainSegment::new(headers).unwrap()
    }

    #[tokio::test]
    async fn test_extend_left_fetches_parents() {
        let client = MockExecutionClient::new();
        let chain = header_chain(0, 10, 6);
        client.set_canonical(chain.clone());
        let mut seg = segment(chain[4..].to_vec());
        extend_left(&mut seg, &client, 3).await.unwrap();
        assert_eq!(seg.earliest().number, 11);
        assert_eq!(seg.len(), 5);
    }

    #[tokio::test]
    async fn test_extend_left_detects_reorg() {
        let client = MockExecutionClient::new();
        let chain = header_chain(0, 10, 6);
        client.set_canonical(chain.clone());
        // A segment from a different branch: its parent hashes do not match
        // the server's blocks.
        let mut seg = segment(header_chain(1, 14, 2));
        assert!(matches!(
            extend_left(&mut seg, &client, 1).await,
            Err(ChainFollowerError::Reorg)
        ));
    }

    #[tokio::test]
    async fn test_new_segment_right() {
        let client = MockExecutionClient::new();
        let chain = header_chain(0, 10, 6);
        client.set_canonical(chain.clone());
        let seg = segment(chain[..2].to_vec());
        let right = new_segment_right(&seg, &client, 3).await.unwrap();
        assert_eq!(right.earliest().number, 12);
        assert_eq!(right.latest().number, 14);
    }

    #[tokio::test]
    async fn test_new_segment_right_detects_reorg() {
        let client = MockExecutionClient::new();
        let chain = header_chain(0, 10, 2);
        // The server replaced block 11 with a fork; block 12 extends the fork.
        let fork = fork_chain(&chain[0], 1, 2);
        let mut canonical = vec![chain[0].clone()];
        canonical.extend(fork);
        client.set_canonical(canonical);
        // The local segment still ends at the reorged-away block 11.
        let seg = segment(chain);
        assert!(matches!(
            new_segment_right(&seg, &client, 1).await,
            Err(ChainFollowerError::Reorg)
        ));
    }

    #[tokio::test]
    async fn test_update_latest_pure_append() {
        let client = MockExecutionClient::new();
        let chain = header_chain(0, 10, 6);
        client.set_canonical(chain.clone());
        let seg = segment(chain[..4].to_vec());
        let update = segment(chain[4..].to_vec());
        let result = update_latest(&seg, &client, update).await.unwrap();
        assert!(result.removed.is_none());
        assert_eq!(result.updated.unwrap().earliest().number, 14);
        assert_eq!(result.full.len(), 6);
    }

    #[tokio::test]
    async fn test_update_latest_fills_gap() {
        let client = MockExecutionClient::new();
        let chain = header_chain(0, 10, 10);
        client.set_canonical(chain.clone());
        let seg = segment(chain[..3].to_vec());
        // Update far to the right of the segment: blocks 17..19.
        let update = segment(chain[7..].to_vec());
        let result = update_latest(&seg, &client, update).await.unwrap();
        assert!(result.removed.is_none());
        let updated = result.updated.unwrap();
        assert_eq!(updated.earliest().number, 13);
        assert_eq!(updated.latest().number, 19);
        assert_eq!(result.full.len(), 10);
    }

    #[tokio::test]
    async fn test_update_latest_reorg_splice() {
        let client = MockExecutionClient::new();
        let chain = header_chain(0, 10, 6);
        // Server switched to a fork replacing blocks 14 and 15 with 14'.
        let fork = fork_chain(&chain[3], 1, 1);
        let mut canonical = chain[..4].to_vec();
        canonical.extend(fork.clone());
        client.set_canonical(canonical);

        let seg = segment(chain.clone());
        let update = segment(fork.clone());
        let result = update_latest(&seg, &client, update).await.unwrap();
        let removed = result.removed.unwrap();
        assert_eq!(removed.earliest().number, 14);
        assert_eq!(removed.len(), 2);
        let updated = result.updated.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated.earliest().hash, fork[0].hash);
        assert_eq!(result.full.latest().hash, fork[0].hash);
        assert_eq!(result.full.len(), 5);
    }

    #[tokio::test]
    async fn test_update_latest_aligned_branch_backtracks() {
        let client = MockExecutionClient::new();
        let chain = header_chain(0, 10, 6);
        // Fork replacing blocks 13..15 with 13'..16'.
        let fork = fork_chain(&chain[2], 1, 4);
        let mut canonical = chain[..3].to_vec();
        canonical.extend(fork.clone());
        client.set_canonical(canonical);

        let seg = segment(chain.clone());
        // Only the head of the fork arrives: block 16', aligned right after
        // the old latest block 15 but with a non-matching parent hash.
        let update = ChainSegment::single(fork[3].clone());
        let result = update_latest(&seg, &client, update).await.unwrap();
        let removed = result.removed.unwrap();
        assert_eq!(removed.earliest().number, 13);
        assert_eq!(removed.len(), 3);
        let updated = result.updated.unwrap();
        assert_eq!(updated.len(), 4);
        assert_eq!(result.full.latest().hash, fork[3].hash);
    }

    #[tokio::test]
    async fn test_update_latest_too_far_in_past() {
        let client = MockExecutionClient::new();
        let chain = header_chain(0, 10, 6);
        client.set_canonical(chain.clone());
        let seg = segment(chain[3..].to_vec());
        let update = segment(chain[..2].to_vec());
        assert!(matches!(
            update_latest(&seg, &client, update).await,
            Err(ChainFollowerError::UpdateTooFarInPast { .. })
        ));
    }
}
