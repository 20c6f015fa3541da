use {
    std::{
        collections,
        sync,
    },
    log::{debug, warn},
    super::{
        handler::{Handler, HandlerRef},
        method::Method,
        req::Req,
        template::{self, UrlTemplate},
    },
};

/// One verb bound to a handler. The template is kept per handler so that
/// binding uses the variable names this registration declared.
#[derive(Clone)]
pub struct UrlHandler {
    verb: Method,
    template: UrlTemplate,
    handler: HandlerRef,
}

impl UrlHandler {
    pub fn verb(&self) -> Method {
        self.verb
    }

    pub fn template(&self) -> &UrlTemplate {
        &self.template
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }
}

#[derive(Clone)]
struct Route {
    template: UrlTemplate,
    handlers: Vec<UrlHandler>,
}

pub enum Resolution<'a> {
    Handled(&'a UrlHandler),
    VerbNotAllowed(Vec<Method>),
    NoTemplate,
}

/// Route table keyed by template skeleton. Routes are scanned in
/// registration order, so the first registered matching shape wins.
#[derive(Default, Clone)]
pub struct Registrar {
    index: collections::HashMap<UrlTemplate, usize>,
    routes: Vec<Route>,
}

impl Registrar {
    /// Registers `handler` for `verb` on `template`. Templates with the same
    /// skeleton share one entry. A second handler for a verb already on that
    /// entry is dropped with a warning: the first registration wins.
    pub fn register(&mut self, verb: Method, template: &str, handler: impl Handler + 'static) {
        let key = UrlTemplate::parse(template);
        let url_handler = UrlHandler {
            verb,
            template: key.clone(),
            handler: sync::Arc::new(handler),
        };

        match self.index.get(&key) {
            Some(&idx) => {
                let route = &mut self.routes[idx];
                if route.handlers.iter().any(|h| h.verb == verb) {
                    warn!("there is already a handler for {} {} (registered as {}); keeping the first",
                        verb, template, route.template);
                    return;
                }
                route.handlers.push(url_handler);
            },
            None => {
                self.index.insert(key.clone(), self.routes.len());
                self.routes.push(Route {
                    template: key,
                    handlers: vec![url_handler],
                });
            },
        }
        debug!("registered {} {}", verb, template);
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Finds the handler for the request's verb and path and, on success,
    /// binds the path variables into the request.
    pub fn resolve(&self, req: &mut Req) -> Resolution<'_> {
        let verb = *req.method();
        let path = req.path().to_string();
        let tokens: Vec<&str> = template::split_path(&path).collect();

        let route = match self.routes.iter().find(|r| r.template.matches_tokens(&tokens)) {
            Some(route) => route,
            None => return Resolution::NoTemplate,
        };

        match route.handlers.iter().find(|h| h.verb == verb) {
            Some(url_handler) => {
                url_handler.template.bind_variables(&path, req);
                Resolution::Handled(url_handler)
            },
            None => Resolution::VerbNotAllowed(route.handlers.iter().map(|h| h.verb).collect()),
        }
    }
}
