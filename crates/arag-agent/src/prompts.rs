//! Prompt templates
//!
//! Placeholders are `{context}`, `{input}`, `{chat_history}` and `{query}`.

use arag_core::{ChatTurn, Document};

pub const ANSWER_TEMPLATE: &str = r#"<persona>
Você é um especialista em marketing integrado à plataforma interna de criação de conteúdo da empresa.
</persona>

<instrucoes_gerais>
Auxilie os profissionais de marketing a gerar conteúdo usando exclusivamente os materiais de referência internos.

1. Baseie a resposta nos materiais de referência fornecidos
2. Observe nos materiais: estratégia de comunicação, públicos-alvo, diretrizes de branding e formatos de conteúdo
</instrucoes_gerais>

<materiais_referencia>
{context}
</materiais_referencia>

<solicitacao_usuario>
{input}
</solicitacao_usuario>
"#;

pub const REPHRASE_TEMPLATE: &str = r#"<contexto>
Você reformula solicitações de usuários de uma ferramenta de marketing que consulta materiais de referência.
Transforme a última solicitação em uma solicitação autônoma, considerando o histórico da conversa.
</contexto>

<diretrizes>
1. Mantenha o foco nos elementos de marketing da empresa
2. Preserve termos técnicos e jargões do domínio
3. Não acrescente informações ausentes do histórico
</diretrizes>

<historico_conversa>
{chat_history}
</historico_conversa>

<nova_solicitacao>
{input}
</nova_solicitacao>

Solicitação Reformulada:"#;

pub const TOPIC_TEMPLATE: &str = r#"Analise se a consulta do usuário está relacionada a marketing ou criação de conteúdo
(criação de conteúdo, estratégia de marketing, branding, comunicação, CRM, campanhas,
mídias sociais, email marketing, marketing digital, estratégia de conteúdo).
Retorne apenas "true" se estiver relacionada, ou "false" se não estiver.

Consulta: {query}

Resposta (true/false):"#;

pub const OFF_TOPIC_MESSAGE: &str = "Desculpe, sou um assistente especializado em marketing e criação de conteúdo. \
    Não posso ajudar com perguntas fora desse contexto. Por favor, faça perguntas relacionadas a marketing, \
    estratégias de comunicação ou criação de conteúdo.";

pub fn answer_prompt(documents: &[Document], input: &str) -> String {
    ANSWER_TEMPLATE
        .replace("{context}", &format_context(documents))
        .replace("{input}", input)
}

pub fn rephrase_prompt(history: &[ChatTurn], input: &str) -> String {
    REPHRASE_TEMPLATE
        .replace("{chat_history}", &format_history(history))
        .replace("{input}", input)
}

pub fn topic_prompt(query: &str) -> String {
    TOPIC_TEMPLATE.replace("{query}", query)
}

/// One `role: content` line per turn, oldest first
pub fn format_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
