//! Record type declarations

use tracing::trace;

use parasol_core::resolved::RecordDecl;
use parasol_core::typed::{TypedRecord, TypedRecordField};
use parasol_core::types::{RecordType, RecordTypeField};
use parasol_core::Type;

use crate::context::Context;
use crate::error::{TypeCheckerError, TypeCheckerErrorKind};

/// Resolve every field of a record; all must be manifest
pub fn check_record(cx: &Context<'_>, record: &RecordDecl) -> Result<TypedRecord, TypeCheckerError> {
    let name = cx.module_name().qualify(record.name.as_str());
    let mut fields = Vec::with_capacity(record.fields.len());

    for field in &record.fields {
        let ty = cx.resolve_type(&field.type_ref);
        if !ty.is_manifest() {
            return Err(TypeCheckerError::new(
                field.type_ref.ident().position.clone(),
                TypeCheckerErrorKind::RecordFieldNotManifest {
                    record: name.to_string(),
                    field: field.name.name.clone(),
                    ty,
                },
            ));
        }
        fields.push(TypedRecordField {
            name: field.name.clone(),
            type_ref: field.type_ref.clone(),
            ty,
        });
    }

    let ty = Type::Record(RecordType {
        name,
        fields: fields
            .iter()
            .map(|field| RecordTypeField {
                name: field.name.name.clone(),
                ty: field.ty.clone(),
            })
            .collect(),
    });
    trace!("record {} with {} fields", ty, fields.len());

    Ok(TypedRecord {
        name: record.name.clone(),
        ty,
        fields,
    })
}
