use std::{fmt::Display, ops::Add};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

pub trait Hashable<T> {
    fn hash(&self) -> T;
}

#[derive(
    Default,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Ord,
    PartialOrd,
)]
pub struct Identity(pub String);

#[derive(
    Default,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Ord,
    PartialOrd,
)]
pub struct TxHash(pub String);

#[derive(
    Default,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Copy,
)]
pub struct BlobIndex(pub usize);

#[derive(
    Default, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct BlobData(pub Vec<u8>);

impl std::fmt::Debug for BlobData {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "BlobData({})", hex::encode(&self.0))
    }
}

/// One call to a contract: the encoded action plus the native amount
/// attached to it.
#[derive(
    Debug,
    Serialize,
    Deserialize,
    Default,
    Clone,
    PartialEq,
    Eq,
    BorshSerialize,
    BorshDeserialize,
    Hash,
)]
pub struct Blob {
    pub contract_name: ContractName,
    pub data: BlobData,
    #[serde(default)]
    pub value: u128,
}

impl Blob {
    /// Decodes the blob payload as the given action type.
    pub fn parameters<Parameters: BorshDeserialize>(&self) -> std::io::Result<Parameters> {
        borsh::from_slice(&self.data.0)
    }
}

pub trait ContractAction: Send {
    fn as_blob(&self, contract_name: ContractName) -> Blob;

    fn as_paid_blob(&self, contract_name: ContractName, value: u128) -> Blob {
        Blob {
            value,
            ..self.as_blob(contract_name)
        }
    }
}

#[derive(
    Default,
    Debug,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    PartialEq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Ord,
    PartialOrd,
)]
pub struct ContractName(pub String);

impl ContractName {
    /// The account a contract holds tokens and native currency under.
    pub fn as_identity(&self) -> Identity {
        Identity(self.0.clone())
    }
}

#[derive(
    Default, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize,
)]
pub struct StateCommitment(pub Vec<u8>);

/// Everything a contract gets to see when one of its blobs is executed.
#[derive(Serialize, Deserialize, Debug, Clone, Default, BorshSerialize, BorshDeserialize)]
pub struct Calldata {
    pub tx_hash: TxHash,
    pub identity: Identity,
    pub blobs: Vec<Blob>,
    pub index: BlobIndex,
}

/// Requests a contract hands back to the node, applied only if the whole
/// transaction settles.
#[derive(
    Debug, Serialize, Deserialize, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize,
)]
pub enum OnchainEffect {
    /// Move the contract's whole native balance to `recipient`.
    SweepNativeBalance { recipient: Identity },
}

impl Identity {
    pub fn new<S: Into<Self>>(s: S) -> Self {
        s.into()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}
impl<S: Into<String>> From<S> for Identity {
    fn from(s: S) -> Self {
        Identity(s.into())
    }
}

impl TxHash {
    pub fn new<S: Into<Self>>(s: S) -> Self {
        s.into()
    }
}
impl<S: Into<String>> From<S> for TxHash {
    fn from(s: S) -> Self {
        TxHash(s.into())
    }
}

impl ContractName {
    pub fn new<S: Into<Self>>(s: S) -> Self {
        s.into()
    }
}
impl<S: Into<String>> From<S> for ContractName {
    fn from(s: S) -> Self {
        ContractName(s.into())
    }
}

impl Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0)
    }
}
impl Display for BlobIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0)
    }
}
impl Display for ContractName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0)
    }
}
impl Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0)
    }
}
impl From<usize> for BlobIndex {
    fn from(i: usize) -> Self {
        BlobIndex(i)
    }
}

#[derive(
    Default,
    Debug,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    PartialEq,
    Hash,
    Copy,
    Ord,
    PartialOrd,
    BorshSerialize,
    BorshDeserialize,
    derive_more::Display,
)]
pub struct BlockHeight(pub u64);

impl Add<u64> for BlockHeight {
    type Output = BlockHeight;
    fn add(self, other: u64) -> BlockHeight {
        BlockHeight(self.0 + other)
    }
}
