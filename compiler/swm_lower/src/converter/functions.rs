//! Function values and their signatures.

use std::rc::Rc;

use super::IrTypeConverter;
use crate::error::{not_implemented, Result};
use crate::signature::IrSignature;
use crate::type_info::{ScalarKind, TypeInfo, TypeInfoKind};
use crate::types::{SilFunctionType, SilFunctionTypeRepresentation};

impl IrTypeConverter<'_> {
    /// Thin functions are a bare code pointer; thick ones pair it with a
    /// context pointer. Non-escaping thick functions share that shape but
    /// never own their context.
    pub(super) fn convert_function(&self, function: &SilFunctionType) -> Result<TypeInfo> {
        let pointer_size = self.config.pointer_size;
        match function.representation {
            SilFunctionTypeRepresentation::Thin
            | SilFunctionTypeRepresentation::Method
            | SilFunctionTypeRepresentation::WitnessMethod
            | SilFunctionTypeRepresentation::Closure => {
                Ok(TypeInfo::pointer(pointer_size, ScalarKind::ThinFunction))
            }
            SilFunctionTypeRepresentation::Thick => Ok(TypeInfo::pointers(
                2,
                pointer_size,
                TypeInfoKind::ThickFunction {
                    is_noescape: function.is_noescape,
                },
            )),
            SilFunctionTypeRepresentation::Block
            | SilFunctionTypeRepresentation::CFunctionPointer
            | SilFunctionTypeRepresentation::ObjCMethod => Err(not_implemented!(
                "@convention({}) function values",
                function.representation.name()
            )),
        }
    }

    /// The physical signature of `function`, expanded once per type.
    pub fn signature(&mut self, function: &SilFunctionType) -> Result<Rc<IrSignature>> {
        if let Some(signature) = self.signatures.get(function) {
            return Ok(Rc::clone(signature));
        }
        let signature = Rc::new(IrSignature::expand(self, function)?);
        self.signatures
            .insert(function.clone(), Rc::clone(&signature));
        Ok(signature)
    }
}
