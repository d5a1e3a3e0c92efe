use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1::Builder as ConnectionBuilder;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tower::service_fn;
use tower::util::BoxCloneService;
use tower::Service as _;
use traject::{Converter, ModelPath, PathRegistry, Router, Variables};

type Body = Full<Bytes>;

#[derive(Clone, Debug)]
enum Model {
    Root,
    Document { id: i64, page: i64 },
}

// GET / and GET /documents/{id}
async fn index(model: Model) -> hyper::Result<Response<Body>> {
    match model {
        Model::Root => Ok(Response::new(Body::from("Hello, world!"))),
        document => Ok(Response::new(Body::from(format!("{document:?}")))),
    }
}

// GET /documents/{id}/+raw
async fn raw(model: Model) -> hyper::Result<Response<Body>> {
    let Model::Document { id, page } = model else {
        return Ok(status(StatusCode::NOT_FOUND, ""));
    };
    Ok(Response::new(Body::from(format!("{id}:{page}"))))
}

fn status(status: StatusCode, message: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(message.to_owned()));
    *response.status_mut() = status;
    response
}

// Each view is a type-erased service taking the resolved model.
//
// We still need a `Mutex` around each service because `BoxCloneService` doesn't
// require the service to implement `Sync`.
type View = Mutex<BoxCloneService<Model, Response<Body>, hyper::Error>>;

struct App {
    router: Router<Model>,
    views: HashMap<&'static str, View>,
}

async fn route(app: Arc<App>, req: Request<Incoming>) -> hyper::Result<Response<Body>> {
    let request = traject::Request::from_parts(req.uri().path(), req.uri().query().unwrap_or(""));

    // a parameter that cannot be decoded is the client's fault
    let resolved = match app.router.consume(&request) {
        Ok(resolved) => resolved,
        Err(err) => return Ok(status(StatusCode::BAD_REQUEST, &err.to_string())),
    };

    let view = resolved.view_name().and_then(|name| app.views.get(name));
    match (view, resolved.model) {
        (Some(view), Some(model)) => {
            // lock the service for a very short time, just to clone the service
            let mut service = match view.lock() {
                Ok(service) => service.clone(),
                Err(_) => return Ok(status(StatusCode::INTERNAL_SERVER_ERROR, "")),
            };
            service.call(model).await
        }
        _ => Ok(status(StatusCode::NOT_FOUND, "")),
    }
}

fn app() -> Result<App, traject::TrajectError> {
    let mut registry = PathRegistry::new();

    registry.register(ModelPath::new("/"), |_: &Variables| Some(Model::Root))?;

    registry.register(
        ModelPath::new("/documents/{id}")
            .converter("id", Converter::int())
            .parameter("page", 0),
        |args: &Variables| {
            let id = args.get_int("id")?;
            // only a hundred documents exist
            (0..100).contains(&id).then(|| Model::Document {
                id,
                page: args.get_int("page").unwrap_or_default(),
            })
        },
    )?;

    let mut views: HashMap<&'static str, View> = HashMap::new();
    views.insert("", BoxCloneService::new(service_fn(index)).into());
    views.insert("raw", BoxCloneService::new(service_fn(raw)).into());

    Ok(App {
        router: registry.build(),
        views,
    })
}

#[tokio::main]
async fn main() {
    let app = Arc::new(app().unwrap());
    let listener = TcpListener::bind(("127.0.0.1", 3000)).await.unwrap();

    loop {
        let app = app.clone();
        let (tcp, _) = listener.accept().await.unwrap();
        tokio::task::spawn(async move {
            if let Err(err) = ConnectionBuilder::new()
                .serve_connection(
                    TokioIo::new(tcp),
                    hyper::service::service_fn(|request| async {
                        route(app.clone(), request).await
                    }),
                )
                .await
            {
                println!("Error serving connection: {:?}", err);
            }
        });
    }
}
