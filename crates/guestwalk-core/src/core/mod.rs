mod access_context;
pub(crate) mod macros;
mod vcpu_id;

pub use self::{
    access_context::{AccessContext, Gfn, Pa, TranslationMechanism, Va},
    vcpu_id::VcpuId,
};
