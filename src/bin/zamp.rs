use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sdk::{utils::format_units, BlobTransaction, ContractAction, ContractName, Identity};
use tracing::{info, warn};
use zamp::{
    genesis::NATIVE_DECIMALS,
    node::Node,
    utils::{
        conf::{Conf, SharedConf},
        logger::setup_tracing,
    },
};
use zamp_sale::ZampTokenSaleAction;
use zamp_token::{erc20::ERC20, ZampTokenAction, TOKEN_DECIMALS};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value = "config.ron")]
    pub config_file: Option<String>,

    /// Overrides the rest listening address
    #[arg(long)]
    pub rest: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Runs the node and its rest API (default)
    Run,
    /// Plays a whole sale against a fresh genesis, then exits
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let conf = Conf::new_shared(args.config_file, args.rest).context("reading config file")?;

    setup_tracing(conf.log_format, conf.id.clone()).context("setting up tracing")?;

    info!("Starting node with config: {:?}", &conf);

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(conf).await,
        Command::Demo => demo(conf).await,
    }
}

async fn run(conf: SharedConf) -> Result<()> {
    let node = Node::new(conf.clone())?;
    if conf.run_rest_server {
        node.run_with_api(conf.rest.clone()).await
    } else {
        node.run().await
    }
}

/// Submits `tx` alone in a block and logs how it settled.
async fn settle(node: &Node, label: &str, tx: BlobTransaction) -> Result<bool> {
    let nonce = node.state().read().await.current_height().0;
    let tx_hash = node.submit(tx.with_nonce(nonce)).await?;
    node.produce_block().await?;

    let indexer = node.indexer().read().await;
    let receipt = indexer
        .receipt(&tx_hash)
        .context("Submitted transaction was not settled")?;
    match &receipt.error {
        None => info!("✅ {}: {}", label, receipt.program_outputs.join(", ")),
        Some(error) => warn!("❌ {}: {}", label, error),
    }
    Ok(receipt.success)
}

async fn demo(conf: SharedConf) -> Result<()> {
    let node = Node::new(conf.clone())?;
    let genesis = &conf.genesis;
    let token_contract = ContractName::new(genesis.token_contract.clone());
    let sale_contract = ContractName::new(genesis.sale_contract.clone());
    let unit = 10u128.pow(TOKEN_DECIMALS.into());
    let price = genesis.token_price as u128;
    let buyer = genesis
        .native_balances
        .keys()
        .find(|account| **account != genesis.admin)
        .cloned()
        .context("Demo needs a funded account besides the admin")?;

    let stock = (genesis.total_supply as u128 * 3 / 4) * unit;
    settle(
        &node,
        "Stock the sale",
        BlobTransaction::new(
            genesis.admin.clone(),
            vec![ZampTokenAction::Transfer {
                recipient: genesis.sale_contract.clone(),
                amount: stock,
            }
            .as_blob(token_contract.clone())],
        ),
    )
    .await?;

    let buy = |amount: u128, paid: u128| {
        BlobTransaction::new(
            buyer.clone(),
            vec![ZampTokenSaleAction::BuyTokens { amount }
                .as_paid_blob(sale_contract.clone(), paid)],
        )
    };
    settle(&node, "Buy 10 units", buy(10, 10 * price)).await?;
    settle(&node, "Buy 10 units, underpaying", buy(10, 10 * price - 1)).await?;

    let end_sale = |caller: &str| {
        BlobTransaction::new(
            caller,
            vec![ZampTokenSaleAction::EndSale.as_blob(sale_contract.clone())],
        )
    };
    settle(&node, "End the sale as the buyer", end_sale(&buyer)).await?;
    settle(&node, "End the sale as the admin", end_sale(&genesis.admin)).await?;

    let state = node.state().read().await;
    let token = state
        .token(&token_contract)
        .context("Token contract is not registered")?;
    let sale = state
        .sale(&sale_contract)
        .context("Sale contract is not registered")?;

    info!(
        "🏁 Sale closed: {} units sold, open: {}",
        sale.tokens_sold(),
        sale.sale_open()
    );
    for account in [&genesis.admin, &buyer, &genesis.sale_contract] {
        info!(
            "{}: {} {}, {} native",
            account,
            format_units(token.balance_of(account), TOKEN_DECIMALS),
            genesis.token_contract,
            format_units(
                state.native_balance(&Identity::new(account.clone())),
                NATIVE_DECIMALS as u8
            )
        );
    }
    Ok(())
}
