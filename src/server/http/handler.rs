use {
    std::sync,
    super::{
        req::Req,
        res::Res,
    },
};

/// Produces the response for a routed request. Failures are expressed as a
/// response carrying an error status.
pub trait Handler: Send + Sync {
    fn process(&self, req: &Req) -> Res;
}

impl<F> Handler for F
where
    F: Fn(&Req) -> Res + Send + Sync,
{
    fn process(&self, req: &Req) -> Res {
        self(req)
    }
}

pub type HandlerRef = sync::Arc<dyn Handler>;
