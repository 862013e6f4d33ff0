//! Post-processing hooks, run on every finished schema.
use crate::error::Result;
use crate::generator::JsonSchemaGenerator;
use crate::model::TypeRef;
use crate::resolver::JsonSchemaResolver;
use crate::schema::SchemaId;

pub struct SchemaProcessorContext<'a> {
    pub ty: &'a TypeRef,
    pub schema: SchemaId,
    pub resolver: &'a mut JsonSchemaResolver,
    pub generator: &'a JsonSchemaGenerator,
}

pub trait SchemaProcessor {
    fn process(&self, ctx: &mut SchemaProcessorContext<'_>) -> Result<()>;
}

impl<F> SchemaProcessor for F
where
    F: Fn(&mut SchemaProcessorContext<'_>) -> Result<()>,
{
    fn process(&self, ctx: &mut SchemaProcessorContext<'_>) -> Result<()> {
        self(ctx)
    }
}
