//! Multi-document write batches.

use super::{DocRef, Document, FieldUpdate};

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set(DocRef, Document),
    Update(DocRef, Vec<FieldUpdate>),
    Delete(DocRef),
}

/// Ordered list of writes committed together by `DocumentStore::commit_batch`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, reference: DocRef, data: Document) -> &mut Self {
        self.ops.push(WriteOp::Set(reference, data));
        self
    }

    pub fn update(&mut self, reference: DocRef, updates: Vec<FieldUpdate>) -> &mut Self {
        self.ops.push(WriteOp::Update(reference, updates));
        self
    }

    pub fn delete(&mut self, reference: DocRef) -> &mut Self {
        self.ops.push(WriteOp::Delete(reference));
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
