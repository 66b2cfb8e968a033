use crate::context::AppContext;
use crate::html::{self, ExportState, Flash};
use actix_cors::Cors;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType, CACHE_CONTROL};
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vitrine_core::{Error, PageView, Rating, Selection};

const MAX_IMAGE_SCALE: f32 = 4.0;

#[derive(Deserialize, Default)]
struct PageQuery {
    /// Display label picked in the selector
    product: Option<String>,
    /// Direct link by image_name
    id: Option<String>,
    /// Selector filter
    q: Option<String>,
}

#[derive(Deserialize)]
struct FeedbackFormData {
    chosen: String,
    product_1: Option<String>,
    product_2: Option<String>,
    product_3: Option<String>,
    product_4: Option<String>,
    rating_1: Option<String>,
    rating_2: Option<String>,
    rating_3: Option<String>,
    rating_4: Option<String>,
    comment: Option<String>,
}

#[derive(Deserialize)]
struct FeedbackRequest {
    chosen: String,
    recommended: Vec<String>,
    ratings: Vec<String>,
    comment: Option<String>,
}

#[derive(Deserialize)]
struct ImageQuery {
    scale: Option<f32>,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Serialize)]
struct NeighbourResult<'a> {
    slot: usize,
    score: Option<f32>,
    product: &'a vitrine_core::ProductRecord,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(ctx: Arc<AppContext>, host: &str, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(ctx.clone()))
                .configure(configure)
        })
        .bind((host, port))?
        .run()
        .await
    }
}

/// Route table, shared by the server and the tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/about", web::get().to(about))
        .route("/health", web::get().to(health))
        .route("/logo", web::get().to(logo))
        .route("/images/{image_name}", web::get().to(image))
        .route("/feedback", web::post().to(submit_form))
        .route("/feedback/export", web::get().to(export_feedback))
        .route("/api/products", web::get().to(list_products))
        .route("/api/products/{image_name}", web::get().to(get_product))
        .route("/api/feedback", web::get().to(list_feedback))
        .route("/api/feedback", web::post().to(submit_json));
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::InvalidFeedback(_) => StatusCode::BAD_REQUEST,
        Error::ProductNotFound(_) => StatusCode::NOT_FOUND,
        Error::Transport(_) => StatusCode::BAD_GATEWAY,
        Error::MissingInput(_) | Error::SchemaMismatch { .. } | Error::DuplicateKeys(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_json(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "error": message.into()
    }))
}

fn html_response(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn parse_ratings<I, S>(values: I) -> Result<Vec<Rating>, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values.into_iter().map(|v| v.as_ref().parse::<Rating>()).collect()
}

async fn export_state(ctx: &AppContext) -> ExportState {
    match ctx.recorder().fetch_all().await {
        Ok(rows) if rows.is_empty() => ExportState::Unavailable,
        Ok(rows) => ExportState::Available { rows: rows.len() },
        Err(e) => ExportState::Failed(e.to_string()),
    }
}

async fn render_index(
    ctx: &AppContext,
    selection: Selection,
    query: &str,
    flash: Option<Flash>,
    status: StatusCode,
) -> HttpResponse {
    let export = export_state(ctx).await;
    let settings = ctx.settings();

    let catalog = match ctx.catalog() {
        Ok(c) => c,
        Err(msg) => return html_response(status, html::render_unavailable(settings, msg, &export)),
    };

    let filtered: Vec<String> = catalog.search(query).into_iter().map(str::to_string).collect();
    let selection = match selection {
        Selection::First if !query.trim().is_empty() => match filtered.first() {
            Some(label) => Selection::Label(label.clone()),
            None => Selection::Label(String::new()),
        },
        other => other,
    };

    let mut page = PageView::build(catalog, &selection, ctx.images());
    let mut labels = filtered;
    // the shown product stays selectable even when the filter excludes it
    if let Some(selected) = &page.selected_label {
        if let Err(pos) = labels.binary_search(selected) {
            labels.insert(pos, selected.clone());
        }
    }
    page.labels = labels;

    html_response(status, html::render_page(settings, &page, query, flash.as_ref(), &export))
}

async fn index(
    ctx: web::Data<Arc<AppContext>>,
    query: web::Query<PageQuery>,
) -> ActixResult<HttpResponse> {
    let query = query.into_inner();
    let selection = match (query.id, query.product) {
        (Some(id), _) => Selection::ImageName(id),
        (None, Some(label)) => Selection::Label(label),
        (None, None) => Selection::First,
    };
    let q = query.q.unwrap_or_default();
    Ok(render_index(&ctx, selection, &q, None, StatusCode::OK).await)
}

async fn about(ctx: web::Data<Arc<AppContext>>) -> ActixResult<HttpResponse> {
    Ok(html_response(StatusCode::OK, html::render_about(ctx.settings())))
}

async fn health(ctx: web::Data<Arc<AppContext>>) -> ActixResult<HttpResponse> {
    match ctx.catalog() {
        Ok(catalog) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "products": catalog.len(),
            "feedback_backend": ctx.recorder().backend(),
        }))),
        Err(msg) => Ok(HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "degraded",
            "error": msg,
        }))),
    }
}

async fn logo(ctx: web::Data<Arc<AppContext>>, req: HttpRequest) -> ActixResult<HttpResponse> {
    match ctx.settings().logo_path() {
        Some(path) => {
            let file = actix_files::NamedFile::open_async(path).await?;
            Ok(file.into_response(&req))
        }
        None => Ok(HttpResponse::NotFound().body("Logo not found.")),
    }
}

async fn image(
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
    query: web::Query<ImageQuery>,
) -> ActixResult<HttpResponse> {
    let image_name = path.into_inner();
    // only catalogue products are probed on disk
    let known = ctx.catalog().map(|c| c.get(&image_name).is_some()).unwrap_or(false);
    if !known {
        return Ok(HttpResponse::NotFound().body(vitrine_core::view::IMAGE_NOT_FOUND));
    }
    let Some(file) = ctx.images().resolve(&image_name).path().map(|p| p.to_path_buf()) else {
        return Ok(HttpResponse::NotFound().body(vitrine_core::view::IMAGE_NOT_FOUND));
    };

    let scale = query
        .scale
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(1.0)
        .min(MAX_IMAGE_SCALE);
    let size = ctx.settings().thumbnail;

    let thumbnail = web::block(move || vitrine_core::render_thumbnail(&file, size, scale)).await?;
    match thumbnail {
        Ok(thumb) => Ok(HttpResponse::Ok()
            .content_type(thumb.mime_type)
            .insert_header((CACHE_CONTROL, "public, max-age=3600"))
            .body(thumb.data)),
        Err(e) => {
            tracing::warn!(image_name = %image_name, error = %e, "thumbnail failed");
            Ok(HttpResponse::UnprocessableEntity().body(vitrine_core::view::IMAGE_UNREADABLE))
        }
    }
}

async fn submit_form(
    ctx: web::Data<Arc<AppContext>>,
    form: web::Form<FeedbackFormData>,
) -> ActixResult<HttpResponse> {
    let form = form.into_inner();
    let recommended: Vec<String> = [form.product_1, form.product_2, form.product_3, form.product_4]
        .into_iter()
        .flatten()
        .collect();
    let ratings = [form.rating_1, form.rating_2, form.rating_3, form.rating_4]
        .into_iter()
        .flatten();

    let outcome = match parse_ratings(ratings) {
        Ok(ratings) => ctx.submit_feedback(&form.chosen, recommended, ratings, form.comment).await,
        Err(e) => Err(e),
    };

    let (flash, status) = match outcome {
        Ok(_) => (Flash::Success("Successfully saved. Thanks!".to_string()), StatusCode::OK),
        Err(e) => (Flash::Error(format!("Error while saving: {}", e)), status_for(&e)),
    };

    Ok(render_index(&ctx, Selection::ImageName(form.chosen), "", Some(flash), status).await)
}

async fn export_feedback(ctx: web::Data<Arc<AppContext>>) -> ActixResult<HttpResponse> {
    match ctx.recorder().export_all().await {
        Ok(export) => Ok(HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(export.filename)],
            })
            .insert_header(("X-Row-Count", export.rows.to_string()))
            .body(export.bytes)),
        Err(e) => Ok(error_json(status_for(&e), format!("Error while loading feedback: {}", e))),
    }
}

async fn list_products(
    ctx: web::Data<Arc<AppContext>>,
    query: web::Query<SearchQuery>,
) -> ActixResult<HttpResponse> {
    let catalog = match ctx.catalog() {
        Ok(c) => c,
        Err(msg) => return Ok(error_json(StatusCode::SERVICE_UNAVAILABLE, msg)),
    };
    let labels = catalog.search(query.q.as_deref().unwrap_or(""));
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "result": labels
    })))
}

async fn get_product(
    ctx: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let catalog = match ctx.catalog() {
        Ok(c) => c,
        Err(msg) => return Ok(error_json(StatusCode::SERVICE_UNAVAILABLE, msg)),
    };
    let image_name = path.into_inner();

    let Some(product) = catalog.get(&image_name) else {
        return Ok(error_json(StatusCode::NOT_FOUND, "Product not found"));
    };

    let neighbours: Vec<NeighbourResult> = catalog
        .resolve_neighbours(product)
        .into_iter()
        .map(|n| NeighbourResult {
            slot: n.slot,
            score: n.score,
            product: n.product,
        })
        .collect();
    let feedback_enabled = neighbours.len() == vitrine_core::NEIGHBOUR_SLOTS;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "result": {
            "product": product,
            "neighbours": neighbours,
            "feedback_enabled": feedback_enabled,
        }
    })))
}

async fn list_feedback(ctx: web::Data<Arc<AppContext>>) -> ActixResult<HttpResponse> {
    match ctx.recorder().fetch_all().await {
        Ok(rows) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": rows
        }))),
        Err(e) => Ok(error_json(status_for(&e), e.to_string())),
    }
}

async fn submit_json(
    ctx: web::Data<Arc<AppContext>>,
    req: web::Json<FeedbackRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    let ratings = match parse_ratings(&req.ratings) {
        Ok(r) => r,
        Err(e) => return Ok(error_json(StatusCode::BAD_REQUEST, e.to_string())),
    };

    match ctx.submit_feedback(&req.chosen, req.recommended, ratings, req.comment).await {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": true
        }))),
        Err(e) => Ok(error_json(status_for(&e), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ViewSettings;
    use actix_web::{test, App};
    use vitrine_core::{Catalog, DuplicatePolicy, ImageResolver, ProductRecord};
    use vitrine_storage::{FeedbackRecorder, MemoryFeedbackStore};

    fn catalog() -> Catalog {
        let mut hub = ProductRecord::new("hub").with_description("Tote");
        for (slot, name) in ["n1", "n2", "n3", "n4"].iter().enumerate() {
            hub = hub.with_neighbour(slot + 1, *name, Some(0.9));
        }
        let partial = ProductRecord::new("partial").with_neighbour(1, "n1", Some(0.8));
        let mut products = vec![hub, partial];
        for name in ["n1", "n2", "n3", "n4"] {
            products.push(ProductRecord::new(name));
        }
        Catalog::from_records(products, DuplicatePolicy::Warn).unwrap()
    }

    fn context(store: Arc<MemoryFeedbackStore>) -> Arc<AppContext> {
        Arc::new(AppContext::new(
            Ok(catalog()),
            ImageResolver::new(Vec::new()),
            FeedbackRecorder::new(store, "test"),
            ViewSettings::default(),
        ))
    }

    #[actix_web::test]
    async fn index_renders_first_product() {
        let store = Arc::new(MemoryFeedbackStore::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(context(store)))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Image ID:</b> <code>hub</code>"));
        assert!(body.contains("Save your input"));
        assert!(body.contains("There is still no saved feedback"));
    }

    #[actix_web::test]
    async fn json_submission_then_export() {
        let store = Arc::new(MemoryFeedbackStore::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(context(store.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/feedback")
            .set_json(serde_json::json!({
                "chosen": "hub",
                "recommended": ["n1", "n2", "n3", "n4"],
                "ratings": ["Good", "Bad", "Medium", "Good"],
                "comment": "nice"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(store.len(), 1);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/feedback/export").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("feedback_test.csv"));
        let body = test::read_body(resp).await;
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("hub;n1;Good;n2;Bad;n3;Medium;n4;Good;nice"));
    }

    #[actix_web::test]
    async fn partial_neighbours_reject_before_store() {
        let store = Arc::new(MemoryFeedbackStore::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(context(store.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/feedback")
            .set_json(serde_json::json!({
                "chosen": "partial",
                "recommended": ["n1", "n2", "n3", "n4"],
                "ratings": ["Good", "Good", "Good", "Good"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.insert_calls(), 0);
    }

    #[actix_web::test]
    async fn form_submission_reports_transport_failure() {
        let store = Arc::new(MemoryFeedbackStore::new());
        store.set_unavailable(true);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(context(store.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/feedback")
            .set_form([
                ("chosen", "hub"),
                ("product_1", "n1"),
                ("product_2", "n2"),
                ("product_3", "n3"),
                ("product_4", "n4"),
                ("rating_1", "Good"),
                ("rating_2", "Good"),
                ("rating_3", "Bad"),
                ("rating_4", "Medium"),
                ("comment", ""),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Error while saving"));
        assert_eq!(store.insert_calls(), 1);
    }

    #[actix_web::test]
    async fn product_endpoint_and_missing_image() {
        let store = Arc::new(MemoryFeedbackStore::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(context(store)))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/products/partial").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["result"]["feedback_enabled"], false);
        assert_eq!(json["result"]["neighbours"][0]["product"]["image_name"], "n1");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/images/hub").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/products/nope").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn logo_served_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("logo.png");
        std::fs::write(&logo, b"not really a png").unwrap();

        let settings = ViewSettings {
            logo: Some(logo),
            ..ViewSettings::default()
        };
        let ctx = Arc::new(AppContext::new(
            Ok(catalog()),
            ImageResolver::new(Vec::new()),
            FeedbackRecorder::new(Arc::new(MemoryFeedbackStore::new()), "test"),
            settings,
        ));
        let app = test::init_service(App::new().app_data(web::Data::new(ctx)).configure(configure)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/logo").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await.as_ref(), b"not really a png");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/about").to_request()).await;
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<img src=\"/logo\""));
        assert!(!body.contains("<strong>VITRINE</strong>"));
    }

    #[actix_web::test]
    async fn missing_catalog_degrades_health() {
        let ctx = Arc::new(AppContext::new(
            Err(Error::MissingInput("data/result_df.csv".into())),
            ImageResolver::new(Vec::new()),
            FeedbackRecorder::new(Arc::new(MemoryFeedbackStore::new()), "test"),
            ViewSettings::default(),
        ));
        let app = test::init_service(App::new().app_data(web::Data::new(ctx)).configure(configure)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("There is still no saved feedback"));
    }

    #[actix_web::test]
    async fn unreadable_store_is_reported_on_page() {
        let store = Arc::new(MemoryFeedbackStore::new());
        store.set_unavailable(true);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(context(store)))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<p class=\"error-box\">Error while loading feedback: "));
        assert!(body.contains("feedback store unavailable"));
    }

    #[actix_web::test]
    async fn unknown_image_names_are_not_cached() {
        let ctx = context(Arc::new(MemoryFeedbackStore::new()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx.clone()))
                .configure(configure),
        )
        .await;

        for i in 0..50 {
            let uri = format!("/images/junk{}", i);
            let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        }
        assert_eq!(ctx.images().cached_misses(), 0);

        // a catalogue product without a file is still a plain miss
        let resp = test::call_service(&app, test::TestRequest::get().uri("/images/n1").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(ctx.images().cached_misses(), 1);
    }

    #[actix_web::test]
    async fn selected_product_survives_filter() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(context(Arc::new(MemoryFeedbackStore::new()))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/?product=partial&q=n1").to_request();
        let resp = test::call_service(&app, req).await;
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<option value=\"partial\" selected>partial</option>"));
        assert!(body.contains("<option value=\"n1\">n1</option>"));
        assert!(!body.contains("<option value=\"n2\">"));
    }
}
