/// quick start - post a lender offer and match it
use p2p_lending_rs::{
    Address, AssetId, InMemoryLedger, Ledger, LenderOfferParams, LendingDesk, Money,
    ProtocolConfig, Rate, SafeTimeProvider, TimeSource, ClaimTokenVault,
};
use chrono::{TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== quick start ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));

    let lender = Address::generate();
    let borrower = Address::generate();
    let usd = AssetId::generate();
    let gold = AssetId::generate();

    let mut ledger = InMemoryLedger::new();
    ledger.credit(usd, lender, Money::from_major(10_000));
    ledger.credit(gold, borrower, Money::from_major(500));

    let mut desk = LendingDesk::new(ProtocolConfig::default(), ledger);
    desk.bind(ClaimTokenVault::new())?;

    // lender posts 1000 usd at 10% flat, 10 daily installments, open to all
    let offer_id = desk.create_lender_offer(
        lender,
        LenderOfferParams {
            lend_asset: usd,
            lend_amount: Money::from_major(1000),
            collateral_assets: vec![gold],
            collateral_amounts: vec![Money::from_major(100)],
            interest: Rate::from_percentage(10),
            period_secs: 86_400,
            installment_count: 10,
            whitelist: Vec::new(),
        },
        &time,
    )?;
    println!("lender offer posted: {}", offer_id);

    // borrower pledges 100 gold and takes the loan
    let loan_id = desk.accept_lender_offer(borrower, offer_id, gold, Money::from_major(100), &time)?;
    println!("loan originated: {}", loan_id);

    let view = desk.loan_view(loan_id, &time)?;
    println!("installment due: {}", view.installment_due);
    println!("installments remaining: {}", view.installments_remaining);
    println!("borrower usd balance: {}", desk.ledger.balance_of(usd, borrower));

    Ok(())
}
