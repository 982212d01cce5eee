use rowbind_db::{StorageClass, ValueRef};

use crate::accessor::Setter;
use crate::codec::{ReadCodec, SqlType};
use crate::error::{AssignmentError, AssignmentFailure, BoxError};

use super::{AssignField, FieldContext};

/// Assigns one column through the member's setter and read codec.
pub(super) struct FieldAssigner<R, F> {
    ctx: FieldContext,
    set: Setter<R, F>,
    codec: ReadCodec<F>,
}

impl<R, F: SqlType> FieldAssigner<R, F> {
    pub(super) const fn new(ctx: FieldContext, set: Setter<R, F>, codec: ReadCodec<F>) -> Self {
        Self { ctx, set, codec }
    }

    fn error(
        &self,
        class: StorageClass,
        failure: AssignmentFailure,
        source: Option<BoxError>,
    ) -> AssignmentError {
        AssignmentError {
            record: self.ctx.record,
            member: self.ctx.member,
            member_type: self.ctx.member_type,
            storage_class: class,
            failure,
            source,
        }
    }
}

impl<R, F: SqlType> AssignField<R> for FieldAssigner<R, F> {
    fn assign(&self, record: &mut R, value: ValueRef<'_>) -> Result<(), AssignmentError> {
        let class = value.storage_class();
        let handler = match class {
            StorageClass::Integer => self.codec.integer(),
            StorageClass::Float => self.codec.float(),
            StorageClass::Text => self.codec.text(),
            StorageClass::Blob => self.codec.blob(),
            StorageClass::Null => self.codec.null(),
        };
        let Some(handler) = handler else {
            return Err(self.error(class, AssignmentFailure::NoConversion, None));
        };
        let converted = handler(value)
            .map_err(|e| self.error(class, AssignmentFailure::ConversionFailed, Some(e)))?;
        (self.set)(record, converted);
        Ok(())
    }

    fn context(&self) -> &FieldContext {
        &self.ctx
    }
}
