use anyhow::Result;
use sdk::{BlobTransaction, ContractAction, ContractName, Event, Identity};
use zamp::{
    indexer::{BlockRange, Direction},
    node::Node,
    node_state::{model::ContractState, NodeState},
    utils::conf::Conf,
};
use zamp_sale::{ZampTokenSale, ZampTokenSaleAction};
use zamp_token::{erc20::ERC20, ZampToken, ZampTokenAction};

const PRICE: u128 = 1_000_000_000_000_000;

fn token() -> ContractName {
    ContractName::new("zamp_token")
}

fn sale() -> ContractName {
    ContractName::new("zamp_sale")
}

fn setup_node() -> Result<Node> {
    let mut state = NodeState::default();
    state.register_contract(
        token(),
        ContractState::Token(ZampToken::new(1_000_000, "admin".to_string())),
    )?;
    state.register_contract(
        sale(),
        ContractState::Sale(ZampTokenSale::new(token(), "admin".into(), PRICE)),
    )?;
    state.credit_native("bob".into(), 1_000 * PRICE)?;
    state.credit_native("admin".into(), 1_000 * PRICE)?;

    Ok(Node::with_state(Conf::new_shared(None, None)?, state))
}

fn transfer(from: &str, to: &str, amount: u128) -> BlobTransaction {
    BlobTransaction::new(
        from,
        vec![ZampTokenAction::Transfer {
            recipient: to.to_string(),
            amount,
        }
        .as_blob(token())],
    )
}

fn buy(buyer: &str, amount: u128, paid: u128) -> BlobTransaction {
    BlobTransaction::new(
        buyer,
        vec![ZampTokenSaleAction::BuyTokens { amount }.as_paid_blob(sale(), paid)],
    )
}

fn end_sale(caller: &str) -> BlobTransaction {
    BlobTransaction::new(caller, vec![ZampTokenSaleAction::EndSale.as_blob(sale())])
}

/// Submits `tx` alone in a block and returns its receipt outcome.
async fn settle(node: &Node, tx: BlobTransaction) -> Result<(bool, Option<String>)> {
    // One transaction per block, so the height is a fresh nonce
    let nonce = node.state().read().await.current_height().0;
    let tx_hash = node.submit(tx.with_nonce(nonce)).await?;
    node.produce_block().await?;
    let indexer = node.indexer().read().await;
    let receipt = indexer.receipt(&tx_hash).expect("settled tx has a receipt");
    Ok((receipt.success, receipt.error.clone()))
}

async fn token_balance(node: &Node, account: &str) -> u128 {
    node.state()
        .read()
        .await
        .token(&token())
        .expect("token is registered")
        .balance_of(account)
}

async fn native_balance(node: &Node, account: &str) -> u128 {
    node.state()
        .read()
        .await
        .native_balance(&Identity::new(account))
}

#[test_log::test(tokio::test)]
async fn test_full_sale() -> Result<()> {
    let node = setup_node()?;

    assert!(settle(&node, transfer("admin", "zamp_sale", 750_000)).await?.0);
    assert_eq!(token_balance(&node, "zamp_sale").await, 750_000);
    assert_eq!(token_balance(&node, "admin").await, 250_000);

    assert!(settle(&node, buy("bob", 10, 10 * PRICE)).await?.0);
    assert_eq!(token_balance(&node, "bob").await, 10);
    assert_eq!(token_balance(&node, "zamp_sale").await, 749_990);
    assert_eq!(native_balance(&node, "zamp_sale").await, 10 * PRICE);
    assert_eq!(native_balance(&node, "bob").await, 990 * PRICE);
    {
        let state = node.state().read().await;
        assert_eq!(state.sale(&sale()).unwrap().tokens_sold(), 10);
    }

    // Off by one wei in both directions
    let (success, error) = settle(&node, buy("bob", 10, 10 * PRICE - 1)).await?;
    assert!(!success);
    assert!(error.unwrap().contains("Payment mismatch"));
    assert!(!settle(&node, buy("bob", 10, 10 * PRICE + 1)).await?.0);
    assert_eq!(token_balance(&node, "bob").await, 10);
    assert_eq!(native_balance(&node, "bob").await, 990 * PRICE);

    let (success, error) = settle(&node, end_sale("bob")).await?;
    assert!(!success);
    assert!(error.unwrap().contains("bob"));

    let admin_native = native_balance(&node, "admin").await;
    assert!(settle(&node, end_sale("admin")).await?.0);
    assert_eq!(token_balance(&node, "zamp_sale").await, 0);
    assert_eq!(token_balance(&node, "admin").await, 999_990);
    assert_eq!(native_balance(&node, "zamp_sale").await, 0);
    assert_eq!(native_balance(&node, "admin").await, admin_native + 10 * PRICE);

    // Closed for good
    assert!(!settle(&node, buy("bob", 1, PRICE)).await?.0);
    let (success, error) = settle(&node, end_sale("admin")).await?;
    assert!(!success);
    assert!(error.unwrap().contains("Sale is already closed"));

    let state = node.state().read().await;
    assert_eq!(state.token_supply_check(&token()), Some((1_000_000, 1_000_000)));
    assert!(!state.sale(&sale()).unwrap().sale_open());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_buy_and_transfer_in_one_tx() -> Result<()> {
    let node = setup_node()?;
    settle(&node, transfer("admin", "zamp_sale", 100)).await?;

    // Bob buys then forwards everything to alice, atomically
    let tx = BlobTransaction::new(
        "bob",
        vec![
            ZampTokenSaleAction::BuyTokens { amount: 5 }.as_paid_blob(sale(), 5 * PRICE),
            ZampTokenAction::Transfer {
                recipient: "alice".to_string(),
                amount: 5,
            }
            .as_blob(token()),
        ],
    );
    assert!(settle(&node, tx).await?.0);
    assert_eq!(token_balance(&node, "alice").await, 5);
    assert_eq!(token_balance(&node, "bob").await, 0);

    // Forwarding more than bought fails the whole tx, purchase included
    let tx = BlobTransaction::new(
        "bob",
        vec![
            ZampTokenSaleAction::BuyTokens { amount: 5 }.as_paid_blob(sale(), 5 * PRICE),
            ZampTokenAction::Transfer {
                recipient: "alice".to_string(),
                amount: 6,
            }
            .as_blob(token()),
        ],
    );
    let (success, error) = settle(&node, tx).await?;
    assert!(!success);
    assert!(error.unwrap().contains("Blob #1"));
    assert_eq!(token_balance(&node, "zamp_sale").await, 95);
    assert_eq!(native_balance(&node, "zamp_sale").await, 5 * PRICE);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_history_follows_settlement() -> Result<()> {
    let node = setup_node()?;
    settle(&node, transfer("admin", "zamp_sale", 100)).await?;
    settle(&node, buy("bob", 3, 3 * PRICE)).await?;
    settle(&node, buy("bob", 3, PRICE)).await?;
    settle(&node, transfer("bob", "carol", 1)).await?;

    let indexer = node.indexer().read().await;
    let bob: Identity = "bob".into();

    let received = indexer.transfer_history(&bob, Direction::Received, BlockRange::default());
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0].event,
        Event::Transfer {
            from: "zamp_sale".into(),
            to: "bob".into(),
            value: 3,
        }
    );

    let sent = indexer.transfer_history(&bob, Direction::Sent, BlockRange::default());
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].block_height.0, 4);

    let sells: Vec<_> = indexer
        .events_for(&bob, BlockRange::default())
        .into_iter()
        .filter(|e| matches!(e.event, Event::Sell { .. }))
        .collect();
    assert_eq!(sells.len(), 1);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_repeated_purchases_and_transfers() -> Result<()> {
    let node = setup_node()?;

    assert!(settle(&node, transfer("admin", "zamp_sale", 100)).await?.0);
    assert!(settle(&node, transfer("admin", "zamp_sale", 100)).await?.0);
    assert_eq!(token_balance(&node, "zamp_sale").await, 200);

    assert!(settle(&node, buy("bob", 10, 10 * PRICE)).await?.0);
    assert!(settle(&node, buy("bob", 10, 10 * PRICE)).await?.0);
    assert_eq!(token_balance(&node, "bob").await, 20);
    assert_eq!(native_balance(&node, "zamp_sale").await, 20 * PRICE);

    // Resending the very same transaction is a replay
    let tx = buy("bob", 1, PRICE).with_nonce(1_000);
    node.submit(tx.clone()).await?;
    assert!(node.submit(tx.clone()).await.is_err());
    node.produce_block().await?;
    assert!(node.submit(tx).await.is_err());
    assert_eq!(token_balance(&node, "bob").await, 21);

    let state = node.state().read().await;
    assert_eq!(state.sale(&sale()).unwrap().tokens_sold(), 21);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_contract_accounts_cannot_send() -> Result<()> {
    let node = setup_node()?;
    assert!(settle(&node, transfer("admin", "zamp_sale", 100)).await?.0);

    let err = node
        .submit(transfer("zamp_sale", "mallory", 100))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("is a registered contract"));
    assert!(node.submit(buy("zamp_sale", 5, 0)).await.is_err());
    assert!(node.submit(end_sale("zamp_token")).await.is_err());
    assert_eq!(node.pending_txs().await, 0);

    assert_eq!(token_balance(&node, "mallory").await, 0);
    assert_eq!(token_balance(&node, "zamp_sale").await, 100);
    let state = node.state().read().await;
    assert_eq!(state.sale(&sale()).unwrap().tokens_sold(), 0);
    Ok(())
}
