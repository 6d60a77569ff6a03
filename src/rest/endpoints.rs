use anyhow::anyhow;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sdk::{utils::format_units, BlobTransaction, ContractName, Identity, IndexedEvent, TxHash};
use tracing::info;
use zamp_token::{erc20::ERC20, TOKEN_DECIMALS};

use super::{
    model::{
        AllowanceInfo, ApiTransaction, BalanceInfo, HistoryQuery, NodeInfo, SaleInfo, TokenInfo,
    },
    AppError, RouterState,
};
use crate::{genesis::NATIVE_DECIMALS, utils::logger::LogMe};

fn not_found(what: &str, name: impl std::fmt::Display) -> AppError {
    AppError(StatusCode::NOT_FOUND, anyhow!("{} {} not found", what, name))
}

pub async fn get_info(State(state): State<RouterState>) -> Result<impl IntoResponse, AppError> {
    let conf = state.node.conf();
    let block_height = state.node.state().read().await.current_height();
    Ok(Json(NodeInfo {
        id: conf.id.clone(),
        block_height,
        token_contract: ContractName::new(conf.genesis.token_contract.clone()),
        sale_contract: ContractName::new(conf.genesis.sale_contract.clone()),
    }))
}

pub async fn get_token(
    Path(contract): Path<ContractName>,
    State(state): State<RouterState>,
) -> Result<impl IntoResponse, AppError> {
    let node_state = state.node.state().read().await;
    let token = node_state
        .token(&contract)
        .ok_or_else(|| not_found("Token contract", &contract))?;
    let (name, symbol, decimals) = token.metadata();

    Ok(Json(TokenInfo {
        total_supply: token.total_supply(),
        contract,
        name,
        symbol,
        decimals,
    }))
}

pub async fn get_balance(
    Path((contract, account)): Path<(ContractName, Identity)>,
    State(state): State<RouterState>,
) -> Result<impl IntoResponse, AppError> {
    let node_state = state.node.state().read().await;
    let token = node_state
        .token(&contract)
        .ok_or_else(|| not_found("Token contract", &contract))?;
    let balance = token.balance_of(&account.0);

    Ok(Json(BalanceInfo {
        account,
        balance,
        formatted: format_units(balance, TOKEN_DECIMALS),
    }))
}

pub async fn get_allowance(
    Path((contract, owner, spender)): Path<(ContractName, Identity, Identity)>,
    State(state): State<RouterState>,
) -> Result<impl IntoResponse, AppError> {
    let node_state = state.node.state().read().await;
    let token = node_state
        .token(&contract)
        .ok_or_else(|| not_found("Token contract", &contract))?;

    Ok(Json(AllowanceInfo {
        allowance: token.allowance(&owner.0, &spender.0),
        owner,
        spender,
    }))
}

pub async fn get_sale(
    Path(contract): Path<ContractName>,
    State(state): State<RouterState>,
) -> Result<impl IntoResponse, AppError> {
    let node_state = state.node.state().read().await;
    let sale = node_state
        .sale(&contract)
        .ok_or_else(|| not_found("Sale contract", &contract))?;
    let inventory = node_state
        .token(sale.token_contract())
        .map(|token| token.balance_of(&contract.0))
        .unwrap_or_default();

    Ok(Json(SaleInfo {
        token_contract: sale.token_contract().clone(),
        admin: sale.admin().clone(),
        token_price: sale.token_price(),
        tokens_sold: sale.tokens_sold(),
        sale_open: sale.sale_open(),
        inventory,
        collected: node_state.native_balance(&contract.as_identity()),
        contract,
    }))
}

pub async fn get_native_balance(
    Path(account): Path<Identity>,
    State(state): State<RouterState>,
) -> Result<impl IntoResponse, AppError> {
    let balance = state.node.state().read().await.native_balance(&account);
    Ok(Json(BalanceInfo {
        account,
        balance,
        formatted: format_units(balance, NATIVE_DECIMALS as u8),
    }))
}

pub async fn get_history(
    Path(account): Path<Identity>,
    Query(query): Query<HistoryQuery>,
    State(state): State<RouterState>,
) -> Result<impl IntoResponse, AppError> {
    let indexer = state.node.indexer().read().await;
    let events: Vec<IndexedEvent> = indexer
        .transfer_history(&account, query.direction, query.range())
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(events))
}

pub async fn get_events(
    Path(account): Path<Identity>,
    Query(query): Query<HistoryQuery>,
    State(state): State<RouterState>,
) -> Result<impl IntoResponse, AppError> {
    let indexer = state.node.indexer().read().await;
    let events: Vec<IndexedEvent> = indexer
        .events_for(&account, query.range())
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(events))
}

pub async fn get_receipt(
    Path(hash): Path<TxHash>,
    State(state): State<RouterState>,
) -> Result<impl IntoResponse, AppError> {
    let indexer = state.node.indexer().read().await;
    let receipt = indexer
        .receipt(&hash)
        .ok_or_else(|| not_found("Transaction", &hash))?;
    Ok(Json(receipt.clone()))
}

async fn handle_send(state: RouterState, tx: BlobTransaction) -> Result<Json<TxHash>, AppError> {
    let tx_hash = state
        .node
        .submit(tx)
        .await
        .log_warn("Rejected transaction")
        .map_err(|e| AppError(StatusCode::BAD_REQUEST, e))?;
    info!("Received transaction {}", tx_hash);
    Ok(Json(tx_hash))
}

pub async fn send_transaction(
    State(state): State<RouterState>,
    Json(payload): Json<ApiTransaction>,
) -> Result<impl IntoResponse, AppError> {
    handle_send(state, payload.into()).await
}

pub async fn send_blob_transaction(
    State(state): State<RouterState>,
    Json(payload): Json<BlobTransaction>,
) -> Result<impl IntoResponse, AppError> {
    handle_send(state, payload).await
}
