//! OpenAPI document assembly, grounded on the teacher's `gateway/openapi.rs`
//! (a single `#[derive(OpenApi)]` struct naming every annotated path and
//! schema). Not a spec.md feature: infrastructure mounted at `/docs` purely
//! so the Terminal/Cart/Stock/ingress surface is browsable.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::terminal::handlers::create_terminal,
        crate::terminal::handlers::get_terminal,
        crate::terminal::handlers::list_terminals,
        crate::terminal::handlers::delete_terminal,
        crate::terminal::handlers::sign_in,
        crate::terminal::handlers::sign_out,
        crate::terminal::handlers::open_terminal,
        crate::terminal::handlers::close_terminal,
        crate::terminal::handlers::cash_in,
        crate::terminal::handlers::cash_out,
        crate::terminal::handlers::update_function_mode,
        crate::terminal::handlers::update_description,
        crate::cart::handlers::open_cart,
        crate::cart::handlers::get_cart,
        crate::cart::handlers::add_item,
        crate::cart::handlers::cancel_item,
        crate::cart::handlers::subtotal,
        crate::cart::handlers::back,
        crate::cart::handlers::add_payment,
        crate::cart::handlers::complete,
        crate::cart::handlers::cancel,
        crate::stock::handlers::get_stock,
        crate::stock::handlers::list_stock,
        crate::stock::handlers::list_low,
        crate::stock::handlers::list_reorder_alerts,
        crate::stock::handlers::update_stock,
        crate::stock::handlers::history,
        crate::stock::handlers::update_minimum,
        crate::stock::handlers::update_reorder,
        crate::stock::handlers::get_snapshot,
        crate::stock::handlers::list_snapshots,
        crate::stock::handlers::create_snapshot,
        crate::snapshot::handlers::get_schedule,
        crate::snapshot::handlers::put_schedule,
        crate::gateway::ingress::tranlog,
        crate::gateway::ingress::cashlog,
        crate::gateway::ingress::opencloselog,
    ),
    components(schemas(
        crate::terminal::handlers::TerminalResponse,
        crate::terminal::handlers::CreateTerminalRequest,
        crate::terminal::handlers::CasRequest,
        crate::terminal::handlers::SignInRequest,
        crate::terminal::handlers::OpenRequest,
        crate::terminal::handlers::CloseRequest,
        crate::terminal::handlers::CashRequest,
        crate::terminal::handlers::FunctionModeRequest,
        crate::terminal::handlers::DescriptionRequest,
        crate::terminal::handlers::EtagResponse,
        crate::terminal::state::TerminalStatus,
        crate::terminal::state::FunctionMode,
        crate::cart::handlers::CartResponse,
        crate::cart::handlers::OpenCartRequest,
        crate::cart::handlers::AddItemRequest,
        crate::cart::handlers::CancelItemRequest,
        crate::cart::handlers::AddPaymentRequest,
        crate::cart::state::CartStatus,
        crate::cart::models::LineItem,
        crate::cart::models::Payment,
        crate::stock::handlers::StockResponse,
        crate::stock::handlers::StockUpdateResponse,
        crate::stock::handlers::StockSnapshotResponse,
        crate::stock::handlers::UpdateStockRequest,
        crate::stock::handlers::MinimumRequest,
        crate::stock::handlers::ReorderRequest,
        crate::stock::state::UpdateType,
        crate::snapshot::handlers::ScheduleResponse,
        crate::snapshot::handlers::PutScheduleRequest,
        crate::snapshot::models::Interval,
        crate::gateway::ingress::InboundEvent,
    )),
    tags(
        (name = "terminal", description = "Terminal lifecycle and cash-drawer operations"),
        (name = "cart", description = "Cart / transaction engine"),
        (name = "stock", description = "Stock levels, thresholds and snapshots"),
        (name = "snapshot", description = "Snapshot schedule configuration"),
        (name = "ingress", description = "Dapr-style event ingress"),
    ),
    info(
        title = "kugel-pos-core",
        description = "Multi-tenant POS backend: terminal lifecycle, cart/transaction engine, stock engine and the event pipeline that couples them.",
        version = "0.1.0",
    ),
)]
pub struct ApiDoc;
