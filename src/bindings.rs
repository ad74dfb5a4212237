// ============================================================================
// API EXPUESTA A JAVASCRIPT
// ============================================================================
// La UI (HTML/JS) llama estas funciones; el estado vive en app::APP.
// Los errores llegan a JS como string con el mensaje.
// ============================================================================

use wasm_bindgen::prelude::*;

use crate::app;
use crate::error::{AppError, CartError, StorageError};
use crate::models::{TransactionAction, TransactionPayload};

impl From<AppError> for JsValue {
    fn from(error: AppError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}

fn storage_err(error: StorageError) -> JsValue {
    AppError::from(error).into()
}

fn cart_err(error: CartError) -> JsValue {
    AppError::from(error).into()
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    Ok(serde_wasm_bindgen::to_value(value)?)
}

fn parse_action(action: &str) -> Result<TransactionAction, JsValue> {
    TransactionAction::parse(action)
        .ok_or_else(|| JsValue::from_str(&format!("acción desconocida: {}", action)))
}

/// Movimiento IN/OUT. Resuelve a `{status: "confirmed" | "rejected" | "saved_offline", ...}`
#[wasm_bindgen]
pub async fn submit_transaction(
    action: String,
    id: String,
    quantity: u32,
    comment: Option<String>,
    price: Option<String>,
) -> Result<JsValue, JsValue> {
    let sync = app::sync_service()?;
    let payload = TransactionPayload::movement(parse_action(&action)?, id.trim(), quantity)
        .with_comment(comment)
        .with_price(price);
    let outcome = sync.submit(payload).await.map_err(storage_err)?;
    to_js(&outcome)
}

/// Alta de producto; sin id el servidor asigna uno
#[wasm_bindgen]
pub async fn create_product(id: Option<String>, nombre: String, stock: i64) -> Result<JsValue, JsValue> {
    let sync = app::sync_service()?;
    let payload = TransactionPayload::create_product(id.as_deref(), nombre.trim(), stock);
    let outcome = sync.submit(payload).await.map_err(storage_err)?;
    to_js(&outcome)
}

#[wasm_bindgen]
pub async fn sync_now() -> Result<JsValue, JsValue> {
    let sync = app::sync_service()?;
    to_js(&sync.tick().await)
}

#[wasm_bindgen]
pub fn sync_status() -> Result<JsValue, JsValue> {
    to_js(&app::sync_service()?.status())
}

#[wasm_bindgen]
pub fn pending_count() -> Result<usize, JsValue> {
    Ok(app::sync_service()?.refresh_pending())
}

#[wasm_bindgen]
pub fn is_online() -> Result<bool, JsValue> {
    app::with_app(|app| app.is_online())
}

#[wasm_bindgen]
pub fn api_url() -> Result<String, JsValue> {
    Ok(app::sync_service()?.api().endpoint())
}

/// Cadena vacía vuelve a la URL por defecto
#[wasm_bindgen]
pub fn set_api_url(url: String) -> Result<(), JsValue> {
    let sync = app::sync_service()?;
    sync.set_api_url(&url).map_err(storage_err)?;
    app::spawn_tick(&sync, "url");
    Ok(())
}

#[wasm_bindgen]
pub fn search_products(query: String) -> Result<JsValue, JsValue> {
    to_js(&app::sync_service()?.search(&query))
}

/// Producto por id (escáner); `undefined` si no existe
#[wasm_bindgen]
pub async fn find_product(id: String) -> Result<JsValue, JsValue> {
    let sync = app::sync_service()?;
    match sync.fetch_product(&id).await {
        Some(product) => to_js(&product),
        None => Ok(JsValue::UNDEFINED),
    }
}

/// Agrega a la lista usando el stock conocido del producto
#[wasm_bindgen]
pub async fn cart_add(
    id: String,
    action: String,
    quantity: u32,
    comment: Option<String>,
    price: Option<String>,
) -> Result<usize, JsValue> {
    let sync = app::sync_service()?;
    let action = parse_action(&action)?;
    let product = match sync.cached_product(&id) {
        Some(product) => product,
        None => sync
            .fetch_product(&id)
            .await
            .ok_or_else(|| JsValue::from_str(&format!("producto {} no encontrado", id)))?,
    };
    let cart = app::cart()?;
    let len = cart
        .borrow_mut()
        .add(&product, action, quantity, comment, price)
        .map_err(cart_err)?;
    Ok(len)
}

#[wasm_bindgen]
pub fn cart_remove(index: usize) -> Result<(), JsValue> {
    app::cart()?.borrow_mut().remove(index).map_err(cart_err)?;
    Ok(())
}

#[wasm_bindgen]
pub fn cart_clear() -> Result<(), JsValue> {
    app::cart()?.borrow_mut().clear();
    Ok(())
}

#[wasm_bindgen]
pub fn cart_items() -> Result<JsValue, JsValue> {
    let cart = app::cart()?;
    let cart = cart.borrow();
    to_js(&cart.items())
}

/// Procesa la lista. Líneas agregadas mientras tanto quedan detrás de las rechazadas.
#[wasm_bindgen]
pub async fn cart_process() -> Result<JsValue, JsValue> {
    let sync = app::sync_service()?;
    let cart = app::cart()?;
    // No se mantiene el borrow durante los await
    let mut batch = cart.borrow_mut().take();
    let report = batch.process(&sync).await;
    cart.borrow_mut().restore(batch);
    to_js(&report)
}
