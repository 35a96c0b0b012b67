//! Checks a feedback claim against the structural diff between the prior
//! and current hypotheses.
//!
//! A split is sound when the union of the new blocks equals the prior
//! block; a merge is sound when the merged block equals the union of the
//! prior blocks. A move holds when every named entity sits in the target
//! block and nowhere else.

use std::collections::BTreeSet;

use duet_core::EntityId;
use duet_core::entities::{FeedbackClaim, Hypothesis};

/// `Ok` when the claim matches what changed, otherwise why it does not.
///
/// # Errors
///
/// Returns a one-line explanation of the mismatch.
pub fn verify_claim(
    claim: &FeedbackClaim,
    prior: Option<&Hypothesis>,
    current: &Hypothesis,
) -> Result<(), String> {
    match claim {
        FeedbackClaim::Move {
            entity_ids,
            target_block,
        } => {
            let target = current
                .block(target_block)
                .ok_or_else(|| format!("block '{target_block}' does not exist"))?;
            for id in entity_ids {
                if !target.contains(*id) {
                    return Err(format!("{id} is not in '{target_block}'"));
                }
                if let Some(other) = current
                    .blocks
                    .iter()
                    .find(|b| b.id != *target_block && b.contains(*id))
                {
                    return Err(format!("{id} is still in '{}'", other.id));
                }
            }
            Ok(())
        }
        FeedbackClaim::Split {
            source_block,
            into_blocks,
        } => {
            let prior = prior.ok_or("there is no prior hypothesis to split from")?;
            let before = members(prior, std::slice::from_ref(source_block), "prior")?;
            let after = members(current, into_blocks, "current")?;
            compare(&before, &after, &format!("split of '{source_block}'"))
        }
        FeedbackClaim::Merge {
            source_blocks,
            into_block,
        } => {
            let prior = prior.ok_or("there is no prior hypothesis to merge from")?;
            let before = members(prior, source_blocks, "prior")?;
            let after = members(current, std::slice::from_ref(into_block), "current")?;
            compare(&before, &after, &format!("merge into '{into_block}'"))
        }
        FeedbackClaim::Declined {
            target_block,
            reason,
        } => {
            if reason.trim().is_empty() {
                Err(format!("declined change to '{target_block}' gives no reason"))
            } else {
                Ok(())
            }
        }
    }
}

/// Union of the entity ids of `blocks` in `hypothesis`.
fn members(
    hypothesis: &Hypothesis,
    blocks: &[String],
    which: &str,
) -> Result<BTreeSet<EntityId>, String> {
    let mut out = BTreeSet::new();
    for id in blocks {
        let block = hypothesis
            .block(id)
            .ok_or_else(|| format!("block '{id}' does not exist in the {which} hypothesis"))?;
        out.extend(block.entity_ids.iter().copied());
    }
    Ok(out)
}

fn compare(
    before: &BTreeSet<EntityId>,
    after: &BTreeSet<EntityId>,
    what: &str,
) -> Result<(), String> {
    if before == after {
        return Ok(());
    }
    let render = |ids: Vec<&EntityId>| {
        ids.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    Err(format!(
        "{what} does not preserve its entities (gained [{}], lost [{}])",
        render(after.difference(before).collect()),
        render(before.difference(after).collect())
    ))
}
