use engine::{
    AddCalculatedCmd, AddCustomCmd, AddItemizedCmd, BusinessVertical, Document, DocumentId,
    DocumentKind, Engine, PriceChoice, QuoteMode, ServiceId, UiSnapshot, parse_currency,
    parse_quantity,
};

use crate::{config::Action, error::Result, render::service_lines};

/// Runs one operator action against the engine. Every mutating action ends
/// with a save so the document is durable when the command returns.
pub fn run(engine: &mut Engine, action: Action, default_vertical: BusinessVertical) -> Result<()> {
    match action {
        Action::New {
            kind,
            vertical,
            client,
        } => {
            let kind = DocumentKind::try_from(kind.as_str())?;
            let vertical = match vertical {
                Some(vertical) => BusinessVertical::try_from(vertical.as_str())?,
                None => default_vertical,
            };
            let id = engine.new_document(kind, vertical);
            engine.set_client(client.as_deref())?;
            engine.save()?;
            println!("created {kind} {id}");
        }
        Action::List { kind } => {
            let kind = DocumentKind::try_from(kind.as_str())?;
            let docs = engine.documents(kind)?;
            if docs.is_empty() {
                println!("no {kind}s stored");
            }
            for doc in docs {
                let total = doc.totals()?.total;
                println!(
                    "{} {} {} {total}",
                    doc.id,
                    doc.client.as_deref().unwrap_or("-"),
                    doc.vertical(),
                );
            }
        }
        Action::Show { kind, id } => {
            open(engine, &kind, &id)?;
            print_document(engine.current_document()?)?;
        }
        Action::AddItem {
            kind,
            id,
            description,
            quantity,
            unit,
            rate,
        } => {
            open(engine, &kind, &id)?;
            let added =
                engine.add_itemized(AddItemizedCmd::from_form(&description, &quantity, &unit, &rate))?;
            engine.save()?;
            println!("added {added}");
        }
        Action::AddCustom {
            kind,
            id,
            description,
            amount,
        } => {
            open(engine, &kind, &id)?;
            let added = engine.add_custom(AddCustomCmd::from_form(&description, &amount))?;
            engine.save()?;
            println!("added {added}");
        }
        Action::Quote {
            kind,
            id,
            sqft,
            tier,
            description,
        } => {
            open(engine, &kind, &id)?;
            let price = engine.select_price(parse_quantity(&sqft), parse_tier(&tier))?;
            let added = engine.add_calculated(AddCalculatedCmd::new(description, price))?;
            engine.save()?;
            println!("added {added} at {}", price.amount);
        }
        Action::Remove { kind, id, entry } => {
            open(engine, &kind, &id)?;
            if engine.remove_by_id(&ServiceId::from(entry.as_str()))? {
                engine.save()?;
                println!("removed {entry}");
            } else {
                println!("no service {entry}, nothing to remove");
            }
        }
        Action::Mode { kind, id, mode } => {
            let doc = open(engine, &kind, &id)?;
            let mode = QuoteMode::try_from(mode.as_str())?;
            let transition = engine.switch_mode(doc.vertical, mode)?;
            engine.save()?;
            println!("{} section now {mode} ({transition:?})", doc.vertical);
        }
        Action::Vertical { kind, id, vertical } => {
            let doc = open(engine, &kind, &id)?;
            let vertical = BusinessVertical::try_from(vertical.as_str())?;
            engine.route(&UiSnapshot::new().showing(doc.kind).selected(vertical));
            engine.save()?;
            println!("{} {} now edits {vertical}", doc.kind, doc.id);
        }
        Action::Delete { kind, id } => {
            let kind = DocumentKind::try_from(kind.as_str())?;
            let id = DocumentId::try_from(id.as_str())?;
            engine.delete_document(kind, id)?;
            println!("deleted {kind} {id}");
        }
    }
    Ok(())
}

#[derive(Clone, Copy)]
struct Opened {
    kind: DocumentKind,
    id: DocumentId,
    vertical: BusinessVertical,
}

fn open(engine: &mut Engine, kind: &str, id: &str) -> Result<Opened> {
    let kind = DocumentKind::try_from(kind)?;
    let id = DocumentId::try_from(id)?;
    let doc = engine.open_document(kind, id)?;
    Ok(Opened {
        kind,
        id,
        vertical: doc.vertical(),
    })
}

/// `low`, `mid` and `high` pick a calculator tier; anything else is read as
/// an amount.
fn parse_tier(raw: &str) -> PriceChoice {
    match raw.trim().to_ascii_lowercase().as_str() {
        "low" => PriceChoice::Low,
        "mid" => PriceChoice::Mid,
        "high" => PriceChoice::High,
        other => PriceChoice::Custom(parse_currency(other)),
    }
}

fn print_document(doc: &Document) -> Result<()> {
    println!("{} {}", doc.kind, doc.id);
    println!("client: {}", doc.client.as_deref().unwrap_or("-"));
    println!("editing: {}", doc.vertical());
    for section in doc.sections() {
        println!("{} ({}):", section.vertical(), section.mode());
        for line in service_lines(section.ledger().entries()) {
            println!("  {line}");
        }
        if !section.stash().is_empty() {
            println!("  {} itemized lines set aside", section.stash().len());
        }
    }
    let totals = doc.totals()?;
    println!("subtotal {}", totals.subtotal);
    if doc.tax_rate_bps > 0 {
        println!("tax {}", totals.tax);
    }
    println!("total {}", totals.total);
    Ok(())
}
