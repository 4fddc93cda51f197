//! The three-pillar "Diagnóstico Estratégico 3F" registry.
//!
//! Scan order is vendas, produto, posicionamento, so vendas wins ties.

use crate::model::{Pillar, StatusLabels};
use crate::registry::PillarRegistry;

pub const VENDAS: &str = "vendas";
pub const PRODUTO: &str = "produto";
pub const POSICIONAMENTO: &str = "posicionamento";

/// `[vendas(0), produto(1), posicionamento(2)]` with their names,
/// recommendations and status phrases.
pub fn three_pillar_registry() -> PillarRegistry {
    let pillars = vec![
        Pillar::new(VENDAS, "Vendas", 0)
            .with_description("Processo comercial, conversão e previsibilidade de receita")
            .with_feedback(
                "Você tem posicionamento e produto, mas não tem previsibilidade comercial. \
                 Cada mês é uma nova batalha. Sem processo de vendas estruturado, você depende \
                 de sorte, timing e esforço manual constante.",
            )
            .with_status_labels(labels(
                "Vendas Reativas",
                "Vendas Inconsistentes",
                "Vendas Estruturadas",
                "Vendas Escaláveis",
            )),
        Pillar::new(PRODUTO, "Produto", 1)
            .with_description("Estruturação, metodologia e escalabilidade da sua oferta")
            .with_feedback(
                "Seu posicionamento pode estar claro, mas sua oferta não está estruturada para \
                 gerar percepção de valor alto. Sem um produto com metodologia, entregáveis \
                 claros e resultados documentados, você limita seu ticket e sua capacidade \
                 de escala.",
            )
            .with_status_labels(labels(
                "Produto Implícito",
                "Produto Estruturável",
                "Produto Validado",
                "Produto Escalável Premium",
            )),
        Pillar::new(POSICIONAMENTO, "Posicionamento", 2)
            .with_description(
                "Clareza de proposta de valor, autoridade e diferenciação no mercado",
            )
            .with_feedback(
                "Sem clareza de posicionamento, você compete por preço e depende de indicações. \
                 O mercado não sabe por que deveria escolher você. Antes de escalar vendas ou \
                 sofisticar seu produto, é preciso definir para quem você é a melhor opção e \
                 por quê.",
            )
            .with_status_labels(labels(
                "Posicionamento Difuso",
                "Posicionamento Técnico",
                "Posicionamento Estratégico",
                "Posicionamento de Autoridade",
            )),
    ];

    match PillarRegistry::new(pillars) {
        Ok(registry) => registry,
        Err(_) => unreachable!("preset registry has three pillars"),
    }
}

fn labels(initial: &str, developing: &str, structured: &str, advanced: &str) -> StatusLabels {
    StatusLabels {
        initial: initial.into(),
        developing: developing.into(),
        structured: structured.into(),
        advanced: advanced.into(),
    }
}
