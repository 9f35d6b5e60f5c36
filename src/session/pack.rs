//! Theory pack loading.
//!
//! A pack is a set of named, already-parsed `.sys2` sub-programs plus an
//! optional index order. Loading runs in one transaction: the whole pack
//! lands or none of it does. Missing entries named by the index are an
//! error only under `validate = true`.

use tracing::debug;

use crate::dsl::TheoryPack;
use crate::model::LearnOutcome;
use crate::{Error, Result};

use super::Session;

pub(crate) fn load(
    session: &mut Session,
    pack: &TheoryPack,
    validate: bool,
) -> Result<LearnOutcome> {
    let order: Vec<String> = match &pack.order {
        Some(order) => order.clone(),
        None => pack.entries.iter().map(|(name, _)| name.clone()).collect(),
    };
    debug!(entries = order.len(), validate, "loading theory pack");

    let snapshot = session.journal_begin();
    let mut outcome = LearnOutcome::default();
    let result = (|| -> Result<()> {
        for name in &order {
            match pack.entry(name) {
                Some(statements) => {
                    let statements = statements.to_vec();
                    session.run_program_in_open_txn(&statements, &mut outcome)?;
                }
                None if validate => {
                    return Err(Error::Io(format!("theory pack entry '{name}' is missing")));
                }
                None => {
                    debug!(entry = %name, "skipping missing pack entry");
                }
            }
        }
        Ok(())
    })();

    session.txn_finish(snapshot, result)?;
    outcome.success = outcome.errors.is_empty();
    Ok(outcome)
}
