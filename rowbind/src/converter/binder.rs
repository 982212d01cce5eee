use crate::accessor::Getter;
use crate::codec::{SqlType, WriteCodec};
use crate::error::{BindingError, BindingFailure, Result};
use crate::native::BindTarget;

use super::{BindField, FieldContext};

/// Binds one member through its getter and write codec.
pub(super) struct FieldBinder<R, F> {
    ctx: FieldContext,
    get: Getter<R, F>,
    codec: WriteCodec<F>,
}

impl<R, F: SqlType> FieldBinder<R, F> {
    pub(super) const fn new(ctx: FieldContext, get: Getter<R, F>, codec: WriteCodec<F>) -> Self {
        Self { ctx, get, codec }
    }

    fn bind_value(&self, value: &F, target: &mut dyn BindTarget, index: usize) -> Result<()> {
        let Some(slot) = self.codec.select(value) else {
            return Err(self.error(value, BindingFailure::NoConversion, None).into());
        };
        let param = slot.convert(value).map_err(|e| {
            self.error(value, BindingFailure::ConversionFailed(slot.class()), Some(e))
        })?;
        target.bind_value(index, param.as_value_ref())?;
        Ok(())
    }

    fn error(
        &self,
        value: &F,
        failure: BindingFailure,
        source: Option<crate::error::BoxError>,
    ) -> BindingError {
        BindingError {
            record: self.ctx.record,
            member: self.ctx.member,
            member_type: self.ctx.member_type,
            value: format!("{value:?}"),
            failure,
            source,
        }
    }
}

impl<R, F: SqlType> BindField<R> for FieldBinder<R, F> {
    fn bind(&self, record: &R, target: &mut dyn BindTarget, index: usize) -> Result<()> {
        self.get
            .with(record, |value| self.bind_value(value, target, index))
    }

    fn context(&self) -> &FieldContext {
        &self.ctx
    }
}
