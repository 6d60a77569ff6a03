use borsh::BorshDeserialize;

use crate::{caller::ExecutionContext, ContractError};
use zamp_model::{Blob, BlobIndex, Calldata};

pub use zamp_model::utils::*;

/// Decodes the blob at `calldata.index` and builds the execution context for
/// it. The caller is the identity that sent the transaction.
pub fn parse_calldata<Parameters>(
    calldata: &Calldata,
) -> Result<(Parameters, ExecutionContext), ContractError>
where
    Parameters: BorshDeserialize,
{
    let blob = find_blob(&calldata.blobs, &calldata.index)?;

    let Ok(parameters) = blob.parameters::<Parameters>() else {
        return Err(ContractError::InvalidInput(format!(
            "Could not deserialize Blob at index {}",
            calldata.index
        )));
    };

    if calldata.identity.is_empty() {
        return Err(ContractError::InvalidInput(
            "Transaction has no identity".to_string(),
        ));
    }

    let exec_ctx = ExecutionContext {
        caller: calldata.identity.clone(),
        contract_name: blob.contract_name.clone(),
        value: blob.value,
        events: Vec::new(),
    };
    Ok((parameters, exec_ctx))
}

fn find_blob<'a>(blobs: &'a [Blob], index: &BlobIndex) -> Result<&'a Blob, ContractError> {
    blobs.get(index.0).ok_or_else(|| {
        ContractError::InvalidInput(format!("Could not find Blob at index {index}"))
    })
}
